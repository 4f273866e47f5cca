//! Turkish tax identifier validation.
//!
//! Two formats exist: the 10-digit VKN (vergi kimlik numarası) identifying a
//! registered business, and the 11-digit TCKN (T.C. kimlik numarası)
//! identifying a natural person.

/// Anonymous consumer identifier assigned when no buyer identifier validates.
/// Mandated by the e-Arşiv schema for retail sales to unidentified buyers.
pub const ANONYMOUS_TCKN: &str = "11111111111";

/// Exactly 10 digits - a business tax identifier.
pub fn is_valid_vkn(id: &str) -> bool {
    id.len() == 10 && id.bytes().all(|b| b.is_ascii_digit())
}

/// Exactly 11 digits - a personal identifier.
pub fn is_valid_tckn(id: &str) -> bool {
    id.len() == 11 && id.bytes().all(|b| b.is_ascii_digit())
}

/// Either format.
pub fn is_valid_tax_id(id: &str) -> bool {
    is_valid_vkn(id) || is_valid_tckn(id)
}

/// `schemeID` attribute value for a UBL `PartyIdentification` block,
/// chosen by digit length.
pub fn scheme_for(id: &str) -> &'static str {
    if id.len() == 11 { "TCKN" } else { "VKN" }
}
