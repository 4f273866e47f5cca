//! UN/CEFACT unit codes for UBL-TR invoice lines.
//!
//! Order sources carry free-text unit labels ("adet", "kg", "çift", …); the
//! document builder maps them onto a small closed vocabulary of codes.
//! Unrecognized labels fall back to the default rather than erroring.

/// Default unit code - one piece ("adet").
pub const DEFAULT_UNIT_CODE: &str = "C62";

/// Map a free-text unit label to its UN/CEFACT Rec 20 code.
pub fn unit_code(label: &str) -> &'static str {
    match label.trim().to_lowercase().as_str() {
        "" | "adet" | "piece" | "pcs" | "pc" | "ad" => "C62",
        "kg" | "kilogram" => "KGM",
        "g" | "gr" | "gram" => "GRM",
        "l" | "lt" | "litre" | "liter" => "LTR",
        "m" | "mt" | "metre" | "meter" => "MTR",
        "m2" | "metrekare" => "MTK",
        "kutu" | "box" => "BX",
        "paket" | "pack" => "PK",
        "çift" | "cift" | "pair" => "PR",
        "set" | "takım" | "takim" => "SET",
        "saat" | "hour" => "HUR",
        "gün" | "gun" | "day" => "DAY",
        _ => DEFAULT_UNIT_CODE,
    }
}

/// Check whether `code` belongs to the closed vocabulary this crate emits.
pub fn is_known_unit_code(code: &str) -> bool {
    EMITTED_UNIT_CODES.binary_search(&code).is_ok()
}

/// Sorted for binary search.
static EMITTED_UNIT_CODES: &[&str] = &[
    "BX",  // Box
    "C62", // One (piece)
    "DAY", // Day
    "GRM", // Gram
    "HUR", // Hour
    "KGM", // Kilogram
    "LTR", // Litre
    "MTK", // Square metre
    "MTR", // Metre
    "PK",  // Pack
    "PR",  // Pair
    "SET", // Set
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turkish_labels() {
        assert_eq!(unit_code("adet"), "C62");
        assert_eq!(unit_code("Adet"), "C62");
        assert_eq!(unit_code("çift"), "PR");
        assert_eq!(unit_code("takım"), "SET");
        assert_eq!(unit_code("gün"), "DAY");
    }

    #[test]
    fn unknown_falls_back_to_piece() {
        assert_eq!(unit_code("furlong"), DEFAULT_UNIT_CODE);
        assert_eq!(unit_code(""), DEFAULT_UNIT_CODE);
        assert_eq!(unit_code("  "), DEFAULT_UNIT_CODE);
    }

    #[test]
    fn every_mapped_code_is_known() {
        for label in ["adet", "kg", "g", "lt", "m", "m2", "kutu", "paket", "çift", "set", "saat", "gün"] {
            assert!(is_known_unit_code(unit_code(label)), "label {label:?}");
        }
    }

    #[test]
    fn list_is_sorted() {
        for window in EMITTED_UNIT_CODES.windows(2) {
            assert!(window[0] < window[1]);
        }
    }
}
