use std::ops::RangeInclusive;

use crate::error::SaddError;
use crate::interval::AgeInterval;
use crate::table::{BucketColumn, PopulationTable, RatioTable, Sex};

/// One strategy of the age-bucket resolution chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Direct,
    RatioDerived,
    Aggregated,
}

/// Fixed evaluation order, most direct source first. A label matching more
/// than one strategy always resolves through the earliest.
pub const STRATEGY_ORDER: [Strategy; 3] =
    [Strategy::Direct, Strategy::RatioDerived, Strategy::Aggregated];

/// A successful match of one requested label against the source tables,
/// carrying the payload its strategy needs to produce a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The label is literally a canonical bucket of the primary table.
    Direct { bucket: usize },
    /// The label is literally a broad bucket of both ratio tables.
    RatioDerived {
        female_bucket: usize,
        male_bucket: usize,
    },
    /// The label's bounds align exactly with a contiguous run of canonical
    /// buckets.
    Aggregated { run: RangeInclusive<usize> },
}

impl Resolution {
    pub fn strategy(&self) -> Strategy {
        match self {
            Resolution::Direct { .. } => Strategy::Direct,
            Resolution::RatioDerived { .. } => Strategy::RatioDerived,
            Resolution::Aggregated { .. } => Strategy::Aggregated,
        }
    }
}

/// Resolve a requested label against the strategy chain.
///
/// Fails with [`SaddError::UnresolvableLabel`] when no strategy applies; the
/// caller must treat that as fatal for the whole run, since the requested
/// labels are a caller contract.
pub fn resolve_label(
    label: &str,
    population: &PopulationTable,
    female_ratios: &RatioTable,
    male_ratios: &RatioTable,
) -> Result<Resolution, SaddError> {
    for strategy in STRATEGY_ORDER {
        if let Some(resolution) =
            try_strategy(strategy, label, population, female_ratios, male_ratios)?
        {
            return Ok(resolution);
        }
    }
    Err(SaddError::UnresolvableLabel {
        label: label.to_string(),
    })
}

fn try_strategy(
    strategy: Strategy,
    label: &str,
    population: &PopulationTable,
    female_ratios: &RatioTable,
    male_ratios: &RatioTable,
) -> Result<Option<Resolution>, SaddError> {
    let resolution = match strategy {
        Strategy::Direct => population
            .bucket_index(label)
            .map(|bucket| Resolution::Direct { bucket }),
        Strategy::RatioDerived => match (
            female_ratios.bucket_index(label),
            male_ratios.bucket_index(label),
        ) {
            (Some(female_bucket), Some(male_bucket)) => Some(Resolution::RatioDerived {
                female_bucket,
                male_bucket,
            }),
            _ => None,
        },
        Strategy::Aggregated => {
            let requested: AgeInterval = label.parse()?;
            aggregation_run(requested, population.buckets())
                .map(|run| Resolution::Aggregated { run })
        }
    };
    Ok(resolution)
}

/// Find the contiguous run of canonical buckets exactly covering `requested`.
///
/// The run starts at the first bucket whose lower bound equals the requested
/// lower bound and ends at the first bucket whose upper bound equals the
/// requested upper bound. Both bounds must match exactly; intervals that fall
/// inside a bucket or off the canonical grid yield `None`.
pub fn aggregation_run(
    requested: AgeInterval,
    buckets: &[BucketColumn],
) -> Option<RangeInclusive<usize>> {
    let start = buckets
        .iter()
        .position(|b| b.interval().lower == requested.lower)?;
    let end = buckets
        .iter()
        .position(|b| b.interval().upper == requested.upper)?;
    if start <= end { Some(start..=end) } else { None }
}

/// Produce the population column for a resolved label, one value per primary
/// table row, in the primary table's row order.
pub fn apply_resolution(
    resolution: &Resolution,
    population: &PopulationTable,
    female_ratios: &RatioTable,
    male_ratios: &RatioTable,
) -> Result<Vec<f64>, SaddError> {
    match resolution {
        Resolution::Direct { bucket } => Ok(population
            .rows()
            .iter()
            .map(|row| row.counts[*bucket])
            .collect()),
        Resolution::RatioDerived {
            female_bucket,
            male_bucket,
        } => {
            let mut column = Vec::with_capacity(population.rows().len());
            for row in population.rows() {
                let (ratios, bucket) = match row.sex {
                    Sex::Female => (female_ratios, *female_bucket),
                    Sex::Male => (male_ratios, *male_bucket),
                };
                let share =
                    ratios
                        .share(&row.location, bucket)
                        .ok_or_else(|| SaddError::MissingRatioRow {
                            location: row.location.clone(),
                            sex: row.sex.to_string(),
                        })?;
                column.push(population.row_total(row) * share / 100.0);
            }
            Ok(column)
        }
        Resolution::Aggregated { run } => Ok(population
            .rows()
            .iter()
            .map(|row| row.counts[run.clone()].iter().sum())
            .collect()),
    }
}
