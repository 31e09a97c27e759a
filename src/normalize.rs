use std::collections::HashMap;

use serde::Serialize;

use crate::geo::CanonicalIdentity;
use crate::table::{Sex, SexGroup};

/// One intermediate row: a location/sex pair with one value per requested
/// label, first raw population counts, percentages after [`normalize`].
#[derive(Debug, Clone)]
pub struct SexedRow {
    pub location: String,
    pub sex: Sex,
    pub values: Vec<f64>,
}

/// One row of the final reconciled table.
#[derive(Debug, Clone, Serialize)]
pub struct OutputRow {
    pub iso3: String,
    pub short_name: String,
    pub region: String,
    pub sex: SexGroup,
    pub values: Vec<f64>,
}

/// Convert population counts into percentages of each location's grand total
/// population. Both sex rows of a location divide by the same denominator.
/// A zero or missing total propagates the IEEE result (NaN or infinity);
/// callers must read that as "unknown", never as zero.
pub fn normalize(rows: &mut [SexedRow], location_totals: &HashMap<String, f64>) {
    for row in rows {
        let total = location_totals.get(&row.location).copied().unwrap_or(0.0);
        for value in &mut row.values {
            *value = *value / total * 100.0;
        }
    }
}

/// Attach canonical identities and drop rows whose location did not resolve.
/// Locations are trimmed before lookup, matching the resolver's keying.
pub fn attach_identities(
    rows: Vec<SexedRow>,
    mapping: &HashMap<String, CanonicalIdentity>,
) -> Vec<OutputRow> {
    rows.into_iter()
        .filter_map(|row| {
            let identity = mapping.get(row.location.trim())?;
            Some(OutputRow {
                iso3: identity.iso3.clone(),
                short_name: identity.short_name.clone(),
                region: identity.region.clone(),
                sex: row.sex.into(),
                values: row.values,
            })
        })
        .collect()
}

/// Append one synthesized `Total` row per canonical identity, summing the
/// normalized Female and Male values column-wise, then sort the table by
/// short name. The sort is stable, so each identity lists Female, Male, then
/// Total.
pub fn with_sex_totals(mut rows: Vec<OutputRow>) -> Vec<OutputRow> {
    let mut order = Vec::new();
    let mut totals: HashMap<String, OutputRow> = HashMap::new();
    for row in &rows {
        let entry = totals.entry(row.iso3.clone()).or_insert_with(|| {
            order.push(row.iso3.clone());
            OutputRow {
                iso3: row.iso3.clone(),
                short_name: row.short_name.clone(),
                region: row.region.clone(),
                sex: SexGroup::Total,
                values: vec![0.0; row.values.len()],
            }
        });
        for (sum, value) in entry.values.iter_mut().zip(&row.values) {
            *sum += value;
        }
    }
    for iso3 in order {
        if let Some(total) = totals.remove(&iso3) {
            rows.push(total);
        }
    }
    rows.sort_by(|a, b| a.short_name.cmp(&b.short_name));
    rows
}
