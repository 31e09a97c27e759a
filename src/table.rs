use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SaddError;
use crate::interval::AgeInterval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sex value of an output row. `Total` rows exist only in the final table,
/// synthesized per canonical identity from the Female and Male rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SexGroup {
    Female,
    Male,
    Total,
}

impl SexGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            SexGroup::Female => "Female",
            SexGroup::Male => "Male",
            SexGroup::Total => "Total",
        }
    }
}

impl From<Sex> for SexGroup {
    fn from(sex: Sex) -> Self {
        match sex {
            Sex::Female => SexGroup::Female,
            Sex::Male => SexGroup::Male,
        }
    }
}

impl fmt::Display for SexGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source age column: the literal header label plus its parsed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketColumn {
    label: String,
    interval: AgeInterval,
}

impl BucketColumn {
    pub fn parse(label: &str) -> Result<Self, SaddError> {
        let interval = label.parse()?;
        Ok(Self {
            label: label.to_string(),
            interval,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn interval(&self) -> AgeInterval {
        self.interval
    }
}

#[derive(Debug, Clone)]
pub struct PopulationRow {
    pub location: String,
    pub sex: Sex,
    pub counts: Vec<f64>,
}

/// The primary population source: one row per (location, sex), one count
/// column per canonical age bucket, in thousands.
#[derive(Debug, Clone)]
pub struct PopulationTable {
    buckets: Vec<BucketColumn>,
    rows: Vec<PopulationRow>,
}

impl PopulationTable {
    pub fn new(bucket_labels: &[String], rows: Vec<PopulationRow>) -> Result<Self, SaddError> {
        let buckets = bucket_labels
            .iter()
            .map(|label| BucketColumn::parse(label))
            .collect::<Result<Vec<_>, _>>()?;
        let mut seen = HashMap::new();
        for row in &rows {
            if seen.insert((row.location.clone(), row.sex), ()).is_some() {
                return Err(SaddError::DuplicatePopulationRow {
                    location: row.location.clone(),
                    sex: row.sex.to_string(),
                });
            }
        }
        Ok(Self { buckets, rows })
    }

    pub fn buckets(&self) -> &[BucketColumn] {
        &self.buckets
    }

    pub fn rows(&self) -> &[PopulationRow] {
        &self.rows
    }

    /// Index of the canonical bucket whose header literally equals `label`.
    pub fn bucket_index(&self, label: &str) -> Option<usize> {
        self.buckets.iter().position(|b| b.label() == label)
    }

    /// Sex-specific total population of one row, summed across all canonical
    /// buckets.
    pub fn row_total(&self, row: &PopulationRow) -> f64 {
        row.counts.iter().sum()
    }

    /// Grand total per location, summed across both sex rows. Every sex row
    /// of a location shares this denominator during normalization.
    pub fn location_totals(&self) -> HashMap<String, f64> {
        let mut totals = HashMap::new();
        for row in &self.rows {
            *totals.entry(row.location.clone()).or_insert(0.0) += self.row_total(row);
        }
        totals
    }
}

#[derive(Debug, Clone)]
pub struct RatioRow {
    pub location: String,
    pub shares: Vec<f64>,
}

/// A per-sex ratio source: one row per location, one percentage column
/// (0-100 of that sex's total population) per broad age bucket.
#[derive(Debug, Clone)]
pub struct RatioTable {
    buckets: Vec<BucketColumn>,
    rows: Vec<RatioRow>,
}

impl RatioTable {
    pub fn new(bucket_labels: &[String], rows: Vec<RatioRow>) -> Result<Self, SaddError> {
        let buckets = bucket_labels
            .iter()
            .map(|label| BucketColumn::parse(label))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { buckets, rows })
    }

    pub fn buckets(&self) -> &[BucketColumn] {
        &self.buckets
    }

    pub fn bucket_index(&self, label: &str) -> Option<usize> {
        self.buckets.iter().position(|b| b.label() == label)
    }

    /// Percentage share for a location, joined by location key rather than
    /// row position. First matching row wins.
    pub fn share(&self, location: &str, bucket: usize) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.location == location)
            .and_then(|row| row.shares.get(bucket))
            .copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub full_name: String,
    pub short_name: String,
    pub iso3: String,
    pub region: String,
}

/// The canonical geographic reference table.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn new(rows: Vec<ReferenceRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn by_full_name(&self, name: &str) -> Option<&ReferenceRow> {
        self.rows.iter().find(|row| row.full_name == name)
    }

    pub fn by_short_name(&self, name: &str) -> Option<&ReferenceRow> {
        self.rows.iter().find(|row| row.short_name == name)
    }

    pub fn by_iso3(&self, iso3: &str) -> Option<&ReferenceRow> {
        self.rows.iter().find(|row| row.iso3 == iso3)
    }
}
