//! UBL-TR 1.2 invoice document generation.
//!
//! The consuming schema validator is order-sensitive: the top-level child
//! blocks must appear in the exact sequence of the UBL-TR Invoice schema,
//! so the builder emits them through a single fixed-order path
//! (see [`document::build`]).
//!
//! The document is emitted *unsigned* - the extension block carries an empty
//! digital-signature placeholder a downstream signer fills in.

mod document;
pub(crate) mod xml_utils;

pub use document::{InvoiceDocument, MonetaryTotals, TaxSubtotal, build};

/// UBL version consumed by the GİB schema validator.
pub const UBL_VERSION_ID: &str = "2.1";

/// UBL-TR customization identifier.
pub const CUSTOMIZATION_ID: &str = "TR1.2";

/// Invoice type code for a sale.
pub const TYPE_CODE_SALE: &str = "SATIS";

/// Turkish VAT tax scheme name and type code (GİB code list 0015).
pub const TAX_SCHEME_NAME: &str = "KDV";
pub const TAX_SCHEME_CODE: &str = "0015";

/// Namespace URIs of the UBL-TR invoice document.
pub mod ubl_ns {
    pub const INVOICE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2";
    pub const CAC: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonAggregateComponents-2";
    pub const CBC: &str = "urn:oasis:names:specification:ubl:schema:xsd:CommonBasicComponents-2";
    pub const EXT: &str =
        "urn:oasis:names:specification:ubl:schema:xsd:CommonExtensionComponents-2";
    pub const DS: &str = "http://www.w3.org/2000/09/xmldsig#";
}
