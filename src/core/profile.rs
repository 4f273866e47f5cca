use serde::{Deserialize, Serialize};

use super::identifier::{ANONYMOUS_TCKN, is_valid_tckn, is_valid_vkn};
use super::types::BuyerParty;

/// Invoice regime - decides which document blocks are required and which
/// transmission envelope is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceProfile {
    /// e-Fatura: business-to-business, delivered to the buyer's registered
    /// mailbox.
    TemelFatura,
    /// e-Arşiv: consumer invoice, archived and delivered electronically.
    EArsivFatura,
}

impl InvoiceProfile {
    /// UBL `ProfileID` value.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TemelFatura => "TEMELFATURA",
            Self::EArsivFatura => "EARSIVFATURA",
        }
    }

    pub fn is_consumer(&self) -> bool {
        matches!(self, Self::EArsivFatura)
    }

    /// Decide the regime for a buyer. Pure and deterministic.
    ///
    /// Business regime only for a validated 10-digit VKN, or a validated
    /// 11-digit TCKN the source order explicitly marked as
    /// business-registered. Everything else - including the anonymous
    /// consumer identifier - is the consumer regime.
    pub fn resolve(buyer: &BuyerParty) -> Self {
        if is_valid_vkn(&buyer.tax_id) {
            return Self::TemelFatura;
        }
        if is_valid_tckn(&buyer.tax_id)
            && buyer.tax_id != ANONYMOUS_TCKN
            && buyer.business_registered
        {
            return Self::TemelFatura;
        }
        Self::EArsivFatura
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buyer(tax_id: &str, business_registered: bool) -> BuyerParty {
        BuyerParty {
            name: "Test Buyer".into(),
            first_name: None,
            family_name: None,
            tax_id: tax_id.into(),
            business_registered,
            email: None,
            street: None,
            district: None,
            city: None,
            postal_code: None,
            country: None,
        }
    }

    #[test]
    fn vkn_is_business() {
        assert_eq!(
            InvoiceProfile::resolve(&buyer("1234567890", false)),
            InvoiceProfile::TemelFatura
        );
    }

    #[test]
    fn tckn_is_consumer_unless_registered() {
        assert_eq!(
            InvoiceProfile::resolve(&buyer("12345678901", false)),
            InvoiceProfile::EArsivFatura
        );
        assert_eq!(
            InvoiceProfile::resolve(&buyer("12345678901", true)),
            InvoiceProfile::TemelFatura
        );
    }

    #[test]
    fn anonymous_is_always_consumer() {
        assert_eq!(
            InvoiceProfile::resolve(&buyer(ANONYMOUS_TCKN, true)),
            InvoiceProfile::EArsivFatura
        );
    }

    #[test]
    fn malformed_id_is_consumer() {
        assert_eq!(
            InvoiceProfile::resolve(&buyer("12AB", false)),
            InvoiceProfile::EArsivFatura
        );
    }

    #[test]
    fn profile_codes() {
        assert_eq!(InvoiceProfile::TemelFatura.code(), "TEMELFATURA");
        assert_eq!(InvoiceProfile::EArsivFatura.code(), "EARSIVFATURA");
        assert!(InvoiceProfile::EArsivFatura.is_consumer());
        assert!(!InvoiceProfile::TemelFatura.is_consumer());
    }
}
