//! Order normalization - converts source-specific order records into the
//! canonical [`InvoiceRequest`].
//!
//! Every supported storefront or marketplace gets one adapter that maps its
//! own field names into [`RawOrder`]; from there the pipeline is
//! source-agnostic. Amounts arrive as raw strings because sources disagree on
//! their numeric types - parsing failures surface as validation errors naming
//! the field.

mod carrier;

pub use carrier::resolve_carrier;

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::core::{
    ANONYMOUS_TCKN, BuyerParty, DeliveryInfo, EfaturaError, InvoiceLine, InvoiceRequest,
    OrderReference, SalesChannel, TenantConfig, identifier::is_valid_tax_id,
};

/// Source-tagged order record, produced by a per-source adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOrder {
    /// Source tag ("storefront", "marketplace", …). Informational only - the
    /// pipeline never branches on it.
    pub source: String,
    pub number: String,
    pub date: NaiveDate,
    pub currency: String,
    pub customer: RawCustomer,
    pub lines: Vec<RawLine>,
    pub carrier_name: Option<String>,
    pub payment_method: Option<String>,
    pub website: Option<String>,
    pub platform: Option<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCustomer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    /// Explicit tax-number field - first candidate in the identifier chain.
    pub tax_number: Option<String>,
    /// Alternate identity field - second candidate.
    pub identity_number: Option<String>,
    /// Source order marked the buyer as a registered business.
    pub business_registered: bool,
    pub billing: RawAddress,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAddress {
    pub street: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    /// Fallback national-id field - last candidate in the identifier chain.
    pub national_id: Option<String>,
}

/// One source line. Prices are VAT-inclusive (gross), as raw strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLine {
    pub name: String,
    pub sku: Option<String>,
    pub quantity: String,
    pub unit: Option<String>,
    pub gross_unit_price: String,
    pub vat_rate: String,
}

/// Build the canonical invoice request from a normalized source order.
///
/// `issued_at` becomes the document's issue date and time; the caller passes
/// the current wall clock. No side effects beyond the returned value.
pub fn normalize(
    order: &RawOrder,
    config: &TenantConfig,
    issued_at: NaiveDateTime,
) -> Result<InvoiceRequest, EfaturaError> {
    if config.supplier.tax_id.trim().is_empty() {
        return Err(EfaturaError::Configuration(
            "supplier tax identifier is not configured for this tenant".into(),
        ));
    }
    if order.lines.is_empty() {
        return Err(EfaturaError::validation("lines", "order has no line items"));
    }

    let (tax_id, anonymous) = resolve_buyer_tax_id(&order.customer);
    if anonymous {
        tracing::debug!(order = %order.number, "no buyer identifier validated, assigning anonymous TCKN");
    }

    let lines = order
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| normalize_line(i, line))
        .collect::<Result<Vec<_>, _>>()?;

    let delivery = order
        .carrier_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            let carrier_tax_id = resolve_carrier(name, &config.carriers);
            if carrier_tax_id.is_none() {
                tracing::warn!(carrier = name, "carrier not in tenant table, emitting name only");
            }
            DeliveryInfo {
                carrier_name: name.to_string(),
                carrier_tax_id,
            }
        });

    let sales_channel = order.website.as_deref().map(|website| SalesChannel {
        website: website.to_string(),
        payment_method: order.payment_method.clone().unwrap_or_default(),
        platform: order.platform.clone().unwrap_or_default(),
    });

    Ok(InvoiceRequest {
        currency: order.currency.clone(),
        issue_date: issued_at.date(),
        issue_time: issued_at.time(),
        supplier: config.supplier.clone(),
        buyer: BuyerParty {
            name: buyer_display_name(&order.customer),
            first_name: order.customer.first_name.clone(),
            family_name: order.customer.last_name.clone(),
            tax_id,
            // an anonymous buyer can never be business-registered
            business_registered: !anonymous && order.customer.business_registered,
            email: order.customer.email.clone(),
            street: order.customer.billing.street.clone(),
            district: order.customer.billing.district.clone(),
            city: order.customer.billing.city.clone(),
            postal_code: order.customer.billing.postal_code.clone(),
            country: order.customer.billing.country.clone(),
        },
        lines,
        delivery,
        order_reference: Some(OrderReference {
            number: order.number.clone(),
            date: order.date,
        }),
        sales_channel,
        notes: order.notes.clone(),
    })
}

/// Strict priority chain: explicit tax number → alternate identity field →
/// billing-address national id. Each candidate is format-validated; the first
/// valid one wins. No valid candidate ⇒ the anonymous consumer identifier,
/// which forces the consumer regime downstream.
///
/// Returns `(identifier, is_anonymous)`.
fn resolve_buyer_tax_id(customer: &RawCustomer) -> (String, bool) {
    let candidates = [
        customer.tax_number.as_deref(),
        customer.identity_number.as_deref(),
        customer.billing.national_id.as_deref(),
    ];
    for candidate in candidates.into_iter().flatten() {
        let candidate = candidate.trim();
        if is_valid_tax_id(candidate) {
            return (candidate.to_string(), false);
        }
    }
    (ANONYMOUS_TCKN.to_string(), true)
}

fn buyer_display_name(customer: &RawCustomer) -> String {
    match customer.company_name.as_deref().map(str::trim) {
        Some(company) if !company.is_empty() => return company.to_string(),
        _ => {}
    }
    let first = customer.first_name.as_deref().unwrap_or("").trim();
    let last = customer.last_name.as_deref().unwrap_or("").trim();
    let full = format!("{first} {last}");
    full.trim().to_string()
}

/// Decompose a gross source line into the canonical net-priced line.
///
/// `line_net = line_gross / (1 + rate/100)` - kept unrounded so that
/// document-level running sums never accumulate rounding drift.
fn normalize_line(index: usize, raw: &RawLine) -> Result<InvoiceLine, EfaturaError> {
    let quantity = parse_amount(&raw.quantity, &format!("lines[{index}].quantity"))?;
    let gross_unit = parse_amount(
        &raw.gross_unit_price,
        &format!("lines[{index}].gross_unit_price"),
    )?;
    let vat_rate = parse_amount(&raw.vat_rate, &format!("lines[{index}].vat_rate"))?;

    if quantity <= Decimal::ZERO {
        return Err(EfaturaError::validation(
            format!("lines[{index}].quantity"),
            "quantity must be positive",
        ));
    }
    if vat_rate < Decimal::ZERO {
        return Err(EfaturaError::validation(
            format!("lines[{index}].vat_rate"),
            "VAT rate must not be negative",
        ));
    }

    let unit_net_price = gross_unit / (Decimal::ONE + vat_rate / dec!(100));

    Ok(InvoiceLine {
        name: raw.name.clone(),
        sku: raw.sku.clone(),
        quantity,
        unit: raw.unit.clone().unwrap_or_default(),
        unit_net_price,
        vat_rate,
    })
}

fn parse_amount(raw: &str, field: &str) -> Result<Decimal, EfaturaError> {
    Decimal::from_str(raw.trim())
        .map_err(|_| EfaturaError::validation(field, format!("'{raw}' is not a valid amount")))
}
