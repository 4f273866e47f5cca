use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Canonical invoice request - the single input shape every order source is
/// normalized into. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRequest {
    /// ISO 4217 currency code (e.g. "TRY").
    pub currency: String,
    pub issue_date: NaiveDate,
    pub issue_time: NaiveTime,
    pub supplier: SupplierParty,
    pub buyer: BuyerParty,
    /// Ordered line items. Never empty for a valid request.
    pub lines: Vec<InvoiceLine>,
    /// Carrier information, if the order ships.
    pub delivery: Option<DeliveryInfo>,
    /// Originating order number and date.
    pub order_reference: Option<OrderReference>,
    /// Storefront metadata emitted as an optional internet-sale block.
    pub sales_channel: Option<SalesChannel>,
    /// Free-text notes carried into the document.
    pub notes: Vec<String>,
}

/// Issuing party, sourced from tenant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierParty {
    pub legal_name: String,
    /// VKN or TCKN. Must be non-empty - enforced by the normalizer and again
    /// by the document builder.
    pub tax_id: String,
    /// Tax office the supplier is registered with (vergi dairesi).
    pub tax_office: String,
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
    pub country: String,
}

/// Invoiced party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerParty {
    /// Display name (company name, or first + family name joined).
    pub name: String,
    pub first_name: Option<String>,
    pub family_name: Option<String>,
    /// Resolved tax identifier. [`crate::core::ANONYMOUS_TCKN`] when no
    /// candidate on the source order validated.
    pub tax_id: String,
    /// Set when the source order explicitly marks an 11-digit identifier as
    /// belonging to a registered business (şahıs şirketi).
    pub business_registered: bool,
    pub email: Option<String>,
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// One invoiced line. Prices are net (VAT-exclusive) and deliberately
/// unrounded - rounding happens only at XML serialization so that running
/// sums across many lines never drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub name: String,
    pub sku: Option<String>,
    pub quantity: Decimal,
    /// Free-text unit label, mapped to a UN/CEFACT code at serialization.
    pub unit: String,
    pub unit_net_price: Decimal,
    /// VAT rate in percent (e.g. 18, not 0.18).
    pub vat_rate: Decimal,
}

impl InvoiceLine {
    /// Net line amount, unrounded.
    pub fn net_amount(&self) -> Decimal {
        self.quantity * self.unit_net_price
    }

    /// VAT amount for the line, unrounded.
    pub fn tax_amount(&self) -> Decimal {
        self.net_amount() * self.vat_rate / dec!(100)
    }

    /// Gross line amount, unrounded.
    pub fn gross_amount(&self) -> Decimal {
        self.net_amount() + self.tax_amount()
    }
}

/// Carrier emitted in the document's delivery block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub carrier_name: String,
    /// Resolved from the tenant's carrier table; `None` when no entry matched
    /// (the name is still emitted, the identifier is left blank).
    pub carrier_tax_id: Option<String>,
}

/// Reference back to the originating order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReference {
    pub number: String,
    pub date: NaiveDate,
}

/// Storefront metadata for the internet-sale document reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesChannel {
    pub website: String,
    pub payment_method: String,
    pub platform: String,
}

/// Per-tenant configuration surface consumed by the core.
///
/// The document series lives separately behind [`crate::core::SeriesStore`]
/// because it is the only mutable shared state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    pub supplier: SupplierParty,
    /// Carrier-name → tax-identifier lookup table.
    pub carriers: Vec<CarrierEntry>,
}

/// One row of the carrier lookup table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarrierEntry {
    pub name: String,
    pub tax_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_amounts_decompose_gross() {
        // 2 × 118.00 gross at 18% - net unit 100.00
        let line = InvoiceLine {
            name: "Widget".into(),
            sku: None,
            quantity: dec!(2),
            unit: "adet".into(),
            unit_net_price: dec!(100),
            vat_rate: dec!(18),
        };
        assert_eq!(line.net_amount(), dec!(200));
        assert_eq!(line.tax_amount(), dec!(36));
        assert_eq!(line.gross_amount(), dec!(236));
    }
}
