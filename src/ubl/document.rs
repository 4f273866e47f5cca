use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::xml_utils::{XmlWriter, format_amount, format_rate, round_amount};
use super::{CUSTOMIZATION_ID, TAX_SCHEME_CODE, TAX_SCHEME_NAME, TYPE_CODE_SALE, UBL_VERSION_ID, ubl_ns};
use crate::core::identifier::scheme_for;
use crate::core::units::unit_code;
use crate::core::{
    BuyerParty, EfaturaError, InvoiceLine, InvoiceProfile, InvoiceRequest, SupplierParty,
};

/// Per-VAT-rate subtotal, rounded to wire precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSubtotal {
    pub rate: Decimal,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
}

/// Document-level monetary totals, rounded to wire precision.
/// `payable` always equals `tax_inclusive - allowance_total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonetaryTotals {
    pub line_extension: Decimal,
    pub tax_exclusive: Decimal,
    pub tax_inclusive: Decimal,
    pub allowance_total: Decimal,
    pub payable: Decimal,
}

/// A fully built, unsigned UBL-TR invoice.
///
/// When transmission fails transiently, the caller resends *this* document
/// (same `uuid`, same `document_id`) rather than allocating a new identifier.
/// A single logical order never receives two document identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDocument {
    /// Request-scoped random identifier, referenced by the signature
    /// placeholder and the provider envelope.
    pub uuid: String,
    /// Allocated series identifier, e.g. "ZNP2024000000001".
    pub document_id: String,
    pub profile: InvoiceProfile,
    /// Complete UTF-8 XML document.
    pub xml: String,
    pub totals: MonetaryTotals,
    /// One entry per distinct VAT rate, ascending.
    pub tax_subtotals: Vec<TaxSubtotal>,
}

/// Build the invoice document for an allocated identifier.
///
/// Fails closed: a partial or best-effort document is never returned.
pub fn build(
    request: &InvoiceRequest,
    document_id: &str,
    profile: InvoiceProfile,
) -> Result<InvoiceDocument, EfaturaError> {
    if request.supplier.tax_id.trim().is_empty() {
        return Err(EfaturaError::Configuration(
            "supplier tax identifier is missing".into(),
        ));
    }
    if request.lines.is_empty() {
        return Err(EfaturaError::validation(
            "lines",
            "cannot build a document without line items",
        ));
    }

    let uuid = Uuid::new_v4().to_string();
    let running = RunningTotals::accumulate(&request.lines);
    let xml = emit(request, document_id, &uuid, profile, &running)?;

    Ok(InvoiceDocument {
        uuid,
        document_id: document_id.to_string(),
        profile,
        xml,
        totals: running.rounded_totals(),
        tax_subtotals: running.rounded_subtotals(),
    })
}

/// Unrounded running sums over all lines. Per-rate groups accumulate the raw
/// net and tax amounts; rounding to 2 decimals happens once, at the edges,
/// never on an intermediate aggregate.
struct RunningTotals {
    line_extension: Decimal,
    tax: Decimal,
    by_rate: BTreeMap<Decimal, (Decimal, Decimal)>,
}

impl RunningTotals {
    fn accumulate(lines: &[InvoiceLine]) -> Self {
        let mut totals = Self {
            line_extension: Decimal::ZERO,
            tax: Decimal::ZERO,
            by_rate: BTreeMap::new(),
        };
        for line in lines {
            let net = line.net_amount();
            let tax = line.tax_amount();
            totals.line_extension += net;
            totals.tax += tax;
            let group = totals
                .by_rate
                .entry(line.vat_rate.normalize())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            group.0 += net;
            group.1 += tax;
        }
        totals
    }

    fn rounded_totals(&self) -> MonetaryTotals {
        let line_extension = round_amount(self.line_extension);
        let tax_inclusive = round_amount(self.line_extension + self.tax);
        let allowance_total = Decimal::ZERO;
        MonetaryTotals {
            line_extension,
            tax_exclusive: line_extension,
            tax_inclusive,
            allowance_total,
            payable: tax_inclusive - allowance_total,
        }
    }

    fn rounded_subtotals(&self) -> Vec<TaxSubtotal> {
        self.by_rate
            .iter()
            .map(|(rate, (base, tax))| TaxSubtotal {
                rate: *rate,
                taxable_amount: round_amount(*base),
                tax_amount: round_amount(*tax),
            })
            .collect()
    }
}

/// The single fixed-order emit path. The UBL-TR validator rejects documents
/// whose top-level blocks are reordered, so every block is written from here
/// and nowhere else.
fn emit(
    request: &InvoiceRequest,
    document_id: &str,
    uuid: &str,
    profile: InvoiceProfile,
    totals: &RunningTotals,
) -> Result<String, EfaturaError> {
    let mut w = XmlWriter::new()?;
    w.start_element_with_attrs(
        "Invoice",
        &[
            ("xmlns", ubl_ns::INVOICE),
            ("xmlns:cac", ubl_ns::CAC),
            ("xmlns:cbc", ubl_ns::CBC),
            ("xmlns:ext", ubl_ns::EXT),
            ("xmlns:ds", ubl_ns::DS),
        ],
    )?;

    write_signature_placeholder(&mut w, uuid)?; // 1
    write_core_properties(&mut w, request, document_id, uuid, profile)?; // 2
    write_order_reference(&mut w, request)?; // 3
    write_additional_references(&mut w, request, uuid, profile)?; // 4
    write_signature_metadata(&mut w, &request.supplier, uuid)?; // 5
    write_supplier_party(&mut w, &request.supplier)?; // 6
    write_customer_party(&mut w, &request.buyer)?; // 7
    write_delivery(&mut w, request)?; // 8
    write_allowance_charge(&mut w, &request.currency)?; // 9
    write_tax_totals(&mut w, &request.currency, totals)?; // 10
    write_monetary_totals(&mut w, &request.currency, totals)?; // 11
    write_lines(&mut w, request)?; // 12

    w.end_element("Invoice")?;
    w.into_string()
}

/// Block 1 - extension block with the empty digital-signature placeholder.
/// The digest, signature value, and certificate stay empty here; a
/// downstream signer fills them in.
fn write_signature_placeholder(w: &mut XmlWriter, uuid: &str) -> Result<(), EfaturaError> {
    w.start_element("ext:UBLExtensions")?;
    w.start_element("ext:UBLExtension")?;
    w.start_element("ext:ExtensionContent")?;
    let signature_id = format!("Signature_{uuid}");
    w.start_element_with_attrs("ds:Signature", &[("Id", signature_id.as_str())])?;
    w.start_element("ds:SignedInfo")?;
    w.empty_element_with_attrs(
        "ds:CanonicalizationMethod",
        &[("Algorithm", "http://www.w3.org/TR/2001/REC-xml-c14n-20010315")],
    )?;
    w.empty_element_with_attrs(
        "ds:SignatureMethod",
        &[("Algorithm", "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256")],
    )?;
    w.start_element_with_attrs("ds:Reference", &[("URI", "")])?;
    w.empty_element_with_attrs(
        "ds:DigestMethod",
        &[("Algorithm", "http://www.w3.org/2001/04/xmlenc#sha256")],
    )?;
    w.empty_element("ds:DigestValue")?;
    w.end_element("ds:Reference")?;
    w.end_element("ds:SignedInfo")?;
    w.empty_element("ds:SignatureValue")?;
    w.start_element("ds:KeyInfo")?;
    w.start_element("ds:X509Data")?;
    w.empty_element("ds:X509Certificate")?;
    w.end_element("ds:X509Data")?;
    w.end_element("ds:KeyInfo")?;
    w.end_element("ds:Signature")?;
    w.end_element("ext:ExtensionContent")?;
    w.end_element("ext:UBLExtension")?;
    w.end_element("ext:UBLExtensions")?;
    Ok(())
}

/// Block 2 - core document properties.
fn write_core_properties(
    w: &mut XmlWriter,
    request: &InvoiceRequest,
    document_id: &str,
    uuid: &str,
    profile: InvoiceProfile,
) -> Result<(), EfaturaError> {
    w.text_element("cbc:UBLVersionID", UBL_VERSION_ID)?;
    w.text_element("cbc:CustomizationID", CUSTOMIZATION_ID)?;
    w.text_element("cbc:ProfileID", profile.code())?;
    w.text_element("cbc:ID", document_id)?;
    w.text_element("cbc:UUID", uuid)?;
    w.text_element("cbc:IssueDate", &request.issue_date.to_string())?;
    w.text_element(
        "cbc:IssueTime",
        &request.issue_time.format("%H:%M:%S").to_string(),
    )?;
    w.text_element("cbc:InvoiceTypeCode", TYPE_CODE_SALE)?;
    for note in &request.notes {
        w.text_element("cbc:Note", note)?;
    }
    w.text_element("cbc:DocumentCurrencyCode", &request.currency)?;
    w.text_element("cbc:LineCountNumeric", &request.lines.len().to_string())?;
    Ok(())
}

/// Block 3 - reference to the originating order.
fn write_order_reference(w: &mut XmlWriter, request: &InvoiceRequest) -> Result<(), EfaturaError> {
    if let Some(order_ref) = &request.order_reference {
        w.start_element("cac:OrderReference")?;
        w.text_element("cbc:ID", &order_ref.number)?;
        w.text_element("cbc:IssueDate", &order_ref.date.to_string())?;
        w.end_element("cac:OrderReference")?;
    }
    Ok(())
}

/// Block 4 - additional document references: the electronic-delivery marker
/// (consumer regime only) and the optional internet-sale marker.
fn write_additional_references(
    w: &mut XmlWriter,
    request: &InvoiceRequest,
    uuid: &str,
    profile: InvoiceProfile,
) -> Result<(), EfaturaError> {
    if profile.is_consumer() {
        w.start_element("cac:AdditionalDocumentReference")?;
        w.text_element("cbc:ID", uuid)?;
        w.text_element("cbc:IssueDate", &request.issue_date.to_string())?;
        w.text_element("cbc:DocumentTypeCode", "SendingType")?;
        w.text_element("cbc:DocumentType", "ELEKTRONIK")?;
        w.end_element("cac:AdditionalDocumentReference")?;
    }
    if let Some(channel) = &request.sales_channel {
        w.start_element("cac:AdditionalDocumentReference")?;
        w.text_element("cbc:ID", &channel.website)?;
        w.text_element("cbc:IssueDate", &request.issue_date.to_string())?;
        w.text_element("cbc:DocumentTypeCode", "SalesPlatform")?;
        w.text_element("cbc:DocumentType", "INTERNET_SATIS")?;
        w.text_element(
            "cbc:DocumentDescription",
            &format!("{} / {}", channel.platform, channel.payment_method),
        )?;
        w.end_element("cac:AdditionalDocumentReference")?;
    }
    Ok(())
}

/// Block 5 - signature metadata identifying the signing party. Distinct from
/// the block-1 placeholder, which holds the signature itself.
fn write_signature_metadata(
    w: &mut XmlWriter,
    supplier: &SupplierParty,
    uuid: &str,
) -> Result<(), EfaturaError> {
    w.start_element("cac:Signature")?;
    w.text_element_with_attrs("cbc:ID", &supplier.tax_id, &[("schemeID", "VKN_TCKN")])?;
    w.start_element("cac:SignatoryParty")?;
    w.start_element("cac:PartyIdentification")?;
    w.text_element_with_attrs(
        "cbc:ID",
        &supplier.tax_id,
        &[("schemeID", scheme_for(&supplier.tax_id))],
    )?;
    w.end_element("cac:PartyIdentification")?;
    write_postal_address(
        w,
        supplier.street.as_deref(),
        supplier.district.as_deref(),
        Some(&supplier.city),
        supplier.postal_code.as_deref(),
        Some(&supplier.country),
    )?;
    w.end_element("cac:SignatoryParty")?;
    w.start_element("cac:DigitalSignatureAttachment")?;
    w.start_element("cac:ExternalReference")?;
    w.text_element("cbc:URI", &format!("#Signature_{uuid}"))?;
    w.end_element("cac:ExternalReference")?;
    w.end_element("cac:DigitalSignatureAttachment")?;
    w.end_element("cac:Signature")?;
    Ok(())
}

/// Block 6 - supplier party.
fn write_supplier_party(w: &mut XmlWriter, supplier: &SupplierParty) -> Result<(), EfaturaError> {
    w.start_element("cac:AccountingSupplierParty")?;
    w.start_element("cac:Party")?;
    w.start_element("cac:PartyIdentification")?;
    w.text_element_with_attrs(
        "cbc:ID",
        &supplier.tax_id,
        &[("schemeID", scheme_for(&supplier.tax_id))],
    )?;
    w.end_element("cac:PartyIdentification")?;
    w.start_element("cac:PartyName")?;
    w.text_element("cbc:Name", &supplier.legal_name)?;
    w.end_element("cac:PartyName")?;
    write_postal_address(
        w,
        supplier.street.as_deref(),
        supplier.district.as_deref(),
        Some(&supplier.city),
        supplier.postal_code.as_deref(),
        Some(&supplier.country),
    )?;
    w.start_element("cac:PartyTaxScheme")?;
    w.start_element("cac:TaxScheme")?;
    w.text_element("cbc:Name", &supplier.tax_office)?;
    w.end_element("cac:TaxScheme")?;
    w.end_element("cac:PartyTaxScheme")?;
    w.end_element("cac:Party")?;
    w.end_element("cac:AccountingSupplierParty")?;
    Ok(())
}

/// Block 7 - customer party. An 11-digit identifier makes the Person block
/// mandatory; a 10-digit business identifier must not carry one.
fn write_customer_party(w: &mut XmlWriter, buyer: &BuyerParty) -> Result<(), EfaturaError> {
    w.start_element("cac:AccountingCustomerParty")?;
    w.start_element("cac:Party")?;
    w.start_element("cac:PartyIdentification")?;
    w.text_element_with_attrs(
        "cbc:ID",
        &buyer.tax_id,
        &[("schemeID", scheme_for(&buyer.tax_id))],
    )?;
    w.end_element("cac:PartyIdentification")?;
    w.start_element("cac:PartyName")?;
    w.text_element("cbc:Name", &buyer.name)?;
    w.end_element("cac:PartyName")?;
    write_postal_address(
        w,
        buyer.street.as_deref(),
        buyer.district.as_deref(),
        buyer.city.as_deref(),
        buyer.postal_code.as_deref(),
        buyer.country.as_deref(),
    )?;
    if let Some(email) = &buyer.email {
        w.start_element("cac:Contact")?;
        w.text_element("cbc:ElectronicMail", email)?;
        w.end_element("cac:Contact")?;
    }
    if buyer.tax_id.len() == 11 {
        let (first, family) = split_person_name(buyer);
        w.start_element("cac:Person")?;
        w.text_element("cbc:FirstName", &first)?;
        w.text_element("cbc:FamilyName", &family)?;
        w.end_element("cac:Person")?;
    }
    w.end_element("cac:Party")?;
    w.end_element("cac:AccountingCustomerParty")?;
    Ok(())
}

/// Block 8 - delivery date plus the optional carrier party.
fn write_delivery(w: &mut XmlWriter, request: &InvoiceRequest) -> Result<(), EfaturaError> {
    w.start_element("cac:Delivery")?;
    w.text_element("cbc:ActualDeliveryDate", &request.issue_date.to_string())?;
    if let Some(delivery) = &request.delivery {
        w.start_element("cac:CarrierParty")?;
        if let Some(tax_id) = delivery
            .carrier_tax_id
            .as_deref()
            .filter(|id| !id.is_empty())
        {
            w.start_element("cac:PartyIdentification")?;
            w.text_element_with_attrs("cbc:ID", tax_id, &[("schemeID", scheme_for(tax_id))])?;
            w.end_element("cac:PartyIdentification")?;
        }
        w.start_element("cac:PartyName")?;
        w.text_element("cbc:Name", &delivery.carrier_name)?;
        w.end_element("cac:PartyName")?;
        w.end_element("cac:CarrierParty")?;
    }
    w.end_element("cac:Delivery")?;
    Ok(())
}

/// Block 9 - the zero-valued allowance block the schema expects even when no
/// discount applies.
fn write_allowance_charge(w: &mut XmlWriter, currency: &str) -> Result<(), EfaturaError> {
    w.start_element("cac:AllowanceCharge")?;
    w.text_element("cbc:ChargeIndicator", "false")?;
    w.amount_element("cbc:Amount", Decimal::ZERO, currency)?;
    w.end_element("cac:AllowanceCharge")?;
    Ok(())
}

/// Block 10 - tax totals with one subtotal per distinct VAT rate.
fn write_tax_totals(
    w: &mut XmlWriter,
    currency: &str,
    totals: &RunningTotals,
) -> Result<(), EfaturaError> {
    w.start_element("cac:TaxTotal")?;
    w.amount_element("cbc:TaxAmount", totals.tax, currency)?;
    for (rate, (base, tax)) in &totals.by_rate {
        write_tax_subtotal(w, currency, *rate, *base, *tax)?;
    }
    w.end_element("cac:TaxTotal")?;
    Ok(())
}

fn write_tax_subtotal(
    w: &mut XmlWriter,
    currency: &str,
    rate: Decimal,
    base: Decimal,
    tax: Decimal,
) -> Result<(), EfaturaError> {
    w.start_element("cac:TaxSubtotal")?;
    w.amount_element("cbc:TaxableAmount", base, currency)?;
    w.amount_element("cbc:TaxAmount", tax, currency)?;
    w.text_element("cbc:Percent", &format_rate(rate))?;
    w.start_element("cac:TaxCategory")?;
    w.start_element("cac:TaxScheme")?;
    w.text_element("cbc:Name", TAX_SCHEME_NAME)?;
    w.text_element("cbc:TaxTypeCode", TAX_SCHEME_CODE)?;
    w.end_element("cac:TaxScheme")?;
    w.end_element("cac:TaxCategory")?;
    w.end_element("cac:TaxSubtotal")?;
    Ok(())
}

/// Block 11 - legal monetary totals.
fn write_monetary_totals(
    w: &mut XmlWriter,
    currency: &str,
    totals: &RunningTotals,
) -> Result<(), EfaturaError> {
    let rounded = totals.rounded_totals();
    w.start_element("cac:LegalMonetaryTotal")?;
    w.amount_element("cbc:LineExtensionAmount", rounded.line_extension, currency)?;
    w.amount_element("cbc:TaxExclusiveAmount", rounded.tax_exclusive, currency)?;
    w.amount_element("cbc:TaxInclusiveAmount", rounded.tax_inclusive, currency)?;
    w.amount_element("cbc:AllowanceTotalAmount", rounded.allowance_total, currency)?;
    w.amount_element("cbc:PayableAmount", rounded.payable, currency)?;
    w.end_element("cac:LegalMonetaryTotal")?;
    Ok(())
}

/// Block 12 - one invoice line per order line, each repeating its own tax
/// subtotal.
fn write_lines(w: &mut XmlWriter, request: &InvoiceRequest) -> Result<(), EfaturaError> {
    for (index, line) in request.lines.iter().enumerate() {
        let net = line.net_amount();
        let tax = line.tax_amount();
        w.start_element("cac:InvoiceLine")?;
        w.text_element("cbc:ID", &(index + 1).to_string())?;
        w.quantity_element("cbc:InvoicedQuantity", line.quantity, unit_code(&line.unit))?;
        w.amount_element("cbc:LineExtensionAmount", net, &request.currency)?;
        w.start_element("cac:TaxTotal")?;
        w.amount_element("cbc:TaxAmount", tax, &request.currency)?;
        write_tax_subtotal(w, &request.currency, line.vat_rate.normalize(), net, tax)?;
        w.end_element("cac:TaxTotal")?;
        w.start_element("cac:Item")?;
        w.text_element("cbc:Name", &line.name)?;
        if let Some(sku) = line.sku.as_deref().filter(|s| !s.is_empty()) {
            w.start_element("cac:SellersItemIdentification")?;
            w.text_element("cbc:ID", sku)?;
            w.end_element("cac:SellersItemIdentification")?;
        }
        w.end_element("cac:Item")?;
        w.start_element("cac:Price")?;
        w.amount_element("cbc:PriceAmount", line.unit_net_price, &request.currency)?;
        w.end_element("cac:Price")?;
        w.end_element("cac:InvoiceLine")?;
    }
    Ok(())
}

fn write_postal_address(
    w: &mut XmlWriter,
    street: Option<&str>,
    district: Option<&str>,
    city: Option<&str>,
    postal_code: Option<&str>,
    country: Option<&str>,
) -> Result<(), EfaturaError> {
    w.start_element("cac:PostalAddress")?;
    if let Some(street) = street {
        w.text_element("cbc:StreetName", street)?;
    }
    if let Some(district) = district {
        w.text_element("cbc:CitySubdivisionName", district)?;
    }
    w.text_element("cbc:CityName", city.unwrap_or(""))?;
    if let Some(postal_code) = postal_code {
        w.text_element("cbc:PostalZone", postal_code)?;
    }
    w.start_element("cac:Country")?;
    w.text_element("cbc:Name", country.unwrap_or("Türkiye"))?;
    w.end_element("cac:Country")?;
    w.end_element("cac:PostalAddress")?;
    Ok(())
}

/// First/family name for the mandatory Person block. Prefers the explicit
/// pair, then splits the display name at its last space; an unsplittable
/// name falls back to placeholder text.
fn split_person_name(buyer: &BuyerParty) -> (String, String) {
    if let (Some(first), Some(family)) = (buyer.first_name.as_deref(), buyer.family_name.as_deref())
    {
        let (first, family) = (first.trim(), family.trim());
        if !first.is_empty() && !family.is_empty() {
            return (first.to_string(), family.to_string());
        }
    }
    let name = buyer.name.trim();
    if let Some((first, family)) = name.rsplit_once(' ') {
        return (first.trim().to_string(), family.trim().to_string());
    }
    if !name.is_empty() {
        return (name.to_string(), "-".to_string());
    }
    ("Ad".to_string(), "Soyad".to_string())
}
