use crate::core::CarrierEntry;

/// Normalize a carrier name for matching: lowercase, punctuation stripped,
/// whitespace collapsed.
pub(crate) fn normalize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Look up a carrier's tax identifier in the tenant's table.
///
/// Matches by containment in either direction, so "Yurtiçi Kargo A.Ş."
/// matches a "yurtiçi kargo" entry and vice versa. Returns `None` when
/// nothing matches - the caller still emits the carrier name, with a blank
/// identifier.
pub fn resolve_carrier(name: &str, table: &[CarrierEntry]) -> Option<String> {
    let needle = normalize_name(name);
    if needle.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|entry| {
            let known = normalize_name(&entry.name);
            !known.is_empty() && (needle.contains(&known) || known.contains(&needle))
        })
        .map(|entry| entry.tax_id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<CarrierEntry> {
        vec![
            CarrierEntry {
                name: "Yurtiçi Kargo".into(),
                tax_id: "9990000001".into(),
            },
            CarrierEntry {
                name: "MNG Kargo".into(),
                tax_id: "9990000002".into(),
            },
        ]
    }

    #[test]
    fn normalization_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(normalize_name("Yurtiçi  Kargo A.Ş."), "yurtiçi kargo a ş");
        assert_eq!(normalize_name("MNG-Kargo"), "mng kargo");
    }

    #[test]
    fn containment_matches_either_direction() {
        // table entry contained in the order's carrier name
        assert_eq!(
            resolve_carrier("Yurtiçi Kargo Servisi A.Ş.", &table()).as_deref(),
            Some("9990000001")
        );
        // order's carrier name contained in the table entry
        assert_eq!(
            resolve_carrier("MNG", &table()).as_deref(),
            Some("9990000002")
        );
    }

    #[test]
    fn no_match_yields_none() {
        assert_eq!(resolve_carrier("Aras Kargo", &table()), None);
        assert_eq!(resolve_carrier("", &table()), None);
        assert_eq!(resolve_carrier("...", &table()), None);
    }
}
