use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::SaddError;
use crate::table::{ReferenceRow, ReferenceTable};

/// The (iso3, short name, region) triple a location name resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalIdentity {
    pub iso3: String,
    pub short_name: String,
    pub region: String,
}

/// One hand-maintained mapping for a name known never to match the reference
/// table verbatim. Short name and region are looked up by iso3 at resolve
/// time, never stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    pub name: String,
    pub iso3: String,
}

/// Source names using alternate administrative phrasing that the reference
/// table spells differently.
pub fn default_overrides() -> Vec<OverrideEntry> {
    [
        ("China, Hong Kong SAR", "HKG"),
        ("China, Macao SAR", "MAC"),
        ("China, Taiwan Province of China", "TWN"),
        ("Dem. People's Republic of Korea", "PRK"),
        ("Micronesia (Fed. States of)", "FSM"),
    ]
    .into_iter()
    .map(|(name, iso3)| OverrideEntry {
        name: name.to_string(),
        iso3: iso3.to_string(),
    })
    .collect()
}

/// Locations excluded before resolution begins. Channel Islands is a UK
/// dependent-territory aggregate with no reference table entry; its rows are
/// dropped by design rather than reported as a resolution failure.
pub const EXCLUDED_LOCATIONS: &[&str] = &["Channel Islands"];

fn identity_from(row: &ReferenceRow) -> CanonicalIdentity {
    CanonicalIdentity {
        iso3: row.iso3.clone(),
        short_name: row.short_name.clone(),
        region: row.region.clone(),
    }
}

/// Resolve raw location names against the reference table through the staged
/// strategy chain: full-name match, then short-name match, then the manual
/// override table. Each stage only sees names the earlier stages left
/// unresolved. Names are trimmed before every comparison; all comparisons are
/// exact-string.
///
/// Names no stage resolves are omitted from the mapping — callers drop their
/// rows. An override whose iso3 is absent from the reference table is a
/// configuration error and fails the run.
pub fn resolve_locations(
    names: &[String],
    reference: &ReferenceTable,
    overrides: &[OverrideEntry],
) -> Result<HashMap<String, CanonicalIdentity>, SaddError> {
    let mut mapping = HashMap::new();
    let mut pending = Vec::new();
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() || EXCLUDED_LOCATIONS.contains(&trimmed) {
            continue;
        }
        if !pending.iter().any(|existing: &String| existing == trimmed) {
            pending.push(trimmed.to_string());
        }
    }

    pending.retain(|name| match reference.by_full_name(name) {
        Some(row) => {
            mapping.insert(name.clone(), identity_from(row));
            false
        }
        None => true,
    });

    pending.retain(|name| match reference.by_short_name(name) {
        Some(row) => {
            // The caller's spelling is already canonical here; keep it as the
            // output short name instead of the reference row's.
            mapping.insert(
                name.clone(),
                CanonicalIdentity {
                    iso3: row.iso3.clone(),
                    short_name: name.clone(),
                    region: row.region.clone(),
                },
            );
            false
        }
        None => true,
    });

    for name in pending {
        let Some(entry) = overrides.iter().find(|entry| entry.name == name) else {
            warn!(location = %name, "location unresolved against reference table; dropping rows");
            continue;
        };
        let row = reference
            .by_iso3(&entry.iso3)
            .ok_or_else(|| SaddError::OverrideIsoNotFound(entry.iso3.clone()))?;
        mapping.insert(
            name,
            CanonicalIdentity {
                iso3: entry.iso3.clone(),
                short_name: row.short_name.clone(),
                region: row.region.clone(),
            },
        );
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ReferenceTable {
        ReferenceTable::new(vec![
            ReferenceRow {
                full_name: "Republic of Testland".to_string(),
                short_name: "Testland".to_string(),
                iso3: "TST".to_string(),
                region: "Oceania".to_string(),
            },
            ReferenceRow {
                full_name: "Kingdom of Exemplar".to_string(),
                short_name: "Exemplar".to_string(),
                iso3: "EXM".to_string(),
                region: "Europe".to_string(),
            },
        ])
    }

    #[test]
    fn full_name_match_uses_reference_short_name() {
        let names = vec!["Republic of Testland ".to_string()];
        let mapping = resolve_locations(&names, &reference(), &[]).unwrap();
        let identity = &mapping["Republic of Testland"];
        assert_eq!(identity.iso3, "TST");
        assert_eq!(identity.short_name, "Testland");
    }

    #[test]
    fn short_name_match_keeps_caller_spelling() {
        let names = vec!["Exemplar".to_string()];
        let mapping = resolve_locations(&names, &reference(), &[]).unwrap();
        assert_eq!(mapping["Exemplar"].short_name, "Exemplar");
        assert_eq!(mapping["Exemplar"].iso3, "EXM");
    }

    #[test]
    fn excluded_location_is_skipped() {
        let names = vec!["Channel Islands".to_string()];
        let mapping = resolve_locations(&names, &reference(), &default_overrides()).unwrap();
        assert!(mapping.is_empty());
    }
}
