#![cfg(feature = "normalize")]

use chrono::{NaiveDate, NaiveDateTime};
use efatura::core::*;
use efatura::normalize::*;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn issued_at() -> NaiveDateTime {
    date(2024, 6, 15).and_hms_opt(14, 30, 0).unwrap()
}

fn supplier() -> SupplierParty {
    SupplierParty {
        legal_name: "Zeynep Tekstil Ltd. Şti.".into(),
        tax_id: "1234567890".into(),
        tax_office: "Kadıköy".into(),
        street: Some("Bağdat Cad. 42".into()),
        district: Some("Kadıköy".into()),
        city: "İstanbul".into(),
        postal_code: Some("34710".into()),
        country: "Türkiye".into(),
    }
}

fn config() -> TenantConfig {
    TenantConfig {
        supplier: supplier(),
        carriers: vec![CarrierEntry {
            name: "Yurtiçi Kargo".into(),
            tax_id: "9990000001".into(),
        }],
    }
}

fn raw_order() -> RawOrder {
    RawOrder {
        source: "storefront".into(),
        number: "ORD-1001".into(),
        date: date(2024, 6, 14),
        currency: "TRY".into(),
        customer: RawCustomer {
            first_name: Some("Ayşe".into()),
            last_name: Some("Yılmaz".into()),
            company_name: None,
            email: Some("ayse@example.com".into()),
            tax_number: None,
            identity_number: None,
            business_registered: false,
            billing: RawAddress {
                city: Some("Ankara".into()),
                country: Some("Türkiye".into()),
                ..RawAddress::default()
            },
        },
        lines: vec![RawLine {
            name: "Pamuklu Tişört".into(),
            sku: Some("TS-042".into()),
            quantity: "2".into(),
            unit: Some("adet".into()),
            gross_unit_price: "118.00".into(),
            vat_rate: "18".into(),
        }],
        carrier_name: Some("Yurtiçi Kargo A.Ş.".into()),
        payment_method: Some("Kredi Kartı".into()),
        website: Some("shop.example.com".into()),
        platform: Some("storefront".into()),
        notes: vec![],
    }
}

#[test]
fn normalizes_a_consumer_order() {
    let request = normalize(&raw_order(), &config(), issued_at()).unwrap();

    assert_eq!(request.currency, "TRY");
    assert_eq!(request.issue_date, date(2024, 6, 15));
    assert_eq!(request.buyer.name, "Ayşe Yılmaz");
    assert_eq!(request.buyer.tax_id, ANONYMOUS_TCKN);
    assert!(!request.buyer.business_registered);
    assert_eq!(
        InvoiceProfile::resolve(&request.buyer),
        InvoiceProfile::EArsivFatura
    );

    let order_ref = request.order_reference.as_ref().unwrap();
    assert_eq!(order_ref.number, "ORD-1001");
    assert_eq!(order_ref.date, date(2024, 6, 14));
}

#[test]
fn gross_prices_decompose_to_net() {
    let request = normalize(&raw_order(), &config(), issued_at()).unwrap();
    let line = &request.lines[0];
    assert_eq!(line.unit_net_price, dec!(100));
    assert_eq!(line.net_amount(), dec!(200));
    assert_eq!(line.tax_amount(), dec!(36));
    assert_eq!(line.gross_amount(), dec!(236));
}

#[test]
fn business_buyer_keeps_vkn_and_regime() {
    let mut order = raw_order();
    order.customer.tax_number = Some("9876543210".into());
    order.customer.company_name = Some("Mehmet Ticaret A.Ş.".into());

    let request = normalize(&order, &config(), issued_at()).unwrap();
    assert_eq!(request.buyer.tax_id, "9876543210");
    assert_eq!(request.buyer.name, "Mehmet Ticaret A.Ş.");
    assert_eq!(
        InvoiceProfile::resolve(&request.buyer),
        InvoiceProfile::TemelFatura
    );
}

#[test]
fn identity_chain_falls_back_to_billing_national_id() {
    let mut order = raw_order();
    order.customer.tax_number = Some("garbage".into());
    order.customer.billing.national_id = Some("12345678901".into());

    let request = normalize(&order, &config(), issued_at()).unwrap();
    assert_eq!(request.buyer.tax_id, "12345678901");
    assert_eq!(
        InvoiceProfile::resolve(&request.buyer),
        InvoiceProfile::EArsivFatura
    );
}

#[test]
fn registered_tckn_buyer_is_business_regime() {
    let mut order = raw_order();
    order.customer.identity_number = Some("12345678901".into());
    order.customer.business_registered = true;

    let request = normalize(&order, &config(), issued_at()).unwrap();
    assert!(request.buyer.business_registered);
    assert_eq!(
        InvoiceProfile::resolve(&request.buyer),
        InvoiceProfile::TemelFatura
    );
}

#[test]
fn carrier_resolved_from_tenant_table() {
    let request = normalize(&raw_order(), &config(), issued_at()).unwrap();
    let delivery = request.delivery.as_ref().unwrap();
    assert_eq!(delivery.carrier_name, "Yurtiçi Kargo A.Ş.");
    assert_eq!(delivery.carrier_tax_id.as_deref(), Some("9990000001"));
}

#[test]
fn unknown_carrier_keeps_name_with_blank_id() {
    let mut order = raw_order();
    order.carrier_name = Some("Aras Kargo".into());
    let request = normalize(&order, &config(), issued_at()).unwrap();
    let delivery = request.delivery.as_ref().unwrap();
    assert_eq!(delivery.carrier_name, "Aras Kargo");
    assert_eq!(delivery.carrier_tax_id, None);
}

#[test]
fn missing_supplier_tax_id_is_configuration_error() {
    let mut cfg = config();
    cfg.supplier.tax_id = "  ".into();
    assert!(matches!(
        normalize(&raw_order(), &cfg, issued_at()),
        Err(EfaturaError::Configuration(_))
    ));
}

#[test]
fn empty_line_set_is_validation_error() {
    let mut order = raw_order();
    order.lines.clear();
    match normalize(&order, &config(), issued_at()) {
        Err(EfaturaError::Validation { field, .. }) => assert_eq!(field, "lines"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn unparseable_price_is_validation_error() {
    let mut order = raw_order();
    order.lines[0].gross_unit_price = "118,00 TL".into();
    match normalize(&order, &config(), issued_at()) {
        Err(EfaturaError::Validation { field, .. }) => {
            assert_eq!(field, "lines[0].gross_unit_price");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}
