use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::config::ResolvedConfig;
use crate::error::SaddError;
use crate::geo::resolve_locations;
use crate::loader::DatasetSource;
use crate::normalize::{SexedRow, attach_identities, normalize, with_sex_totals};
use crate::output::TableSink;
use crate::resolve::{Resolution, Strategy, apply_resolution, resolve_label};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub labels: Vec<LabelSummary>,
    pub locations_resolved: usize,
    pub locations_dropped: Vec<String>,
    pub rows: usize,
    pub output: Option<String>,
}

/// Which strategy satisfied one requested label, for run diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct LabelSummary {
    pub label: String,
    pub strategy: String,
    pub aggregated_buckets: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

fn strategy_name(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Direct => "direct",
        Strategy::RatioDerived => "ratio-derived",
        Strategy::Aggregated => "aggregated",
    }
}

#[derive(Clone)]
pub struct App<S: DatasetSource, K: TableSink> {
    source: S,
    sink: K,
}

impl<S: DatasetSource, K: TableSink> App<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self { source, sink }
    }

    /// Run the whole pipeline: load, resolve every requested label, normalize
    /// to percentages, reconcile country identities, synthesize Total rows,
    /// and write the table. Any unresolvable label aborts before anything is
    /// written.
    pub fn generate(
        &self,
        config: &ResolvedConfig,
        options: RunOptions,
        progress: &dyn ProgressSink,
    ) -> Result<RunSummary, SaddError> {
        progress.event(ProgressEvent {
            message: "phase=Load; reading source tables".to_string(),
            elapsed: None,
        });
        let population = self.source.load_population()?;
        let female_ratios = self.source.load_female_ratios()?;
        let male_ratios = self.source.load_male_ratios()?;
        let reference = self.source.load_reference()?;

        progress.event(ProgressEvent {
            message: format!("phase=Resolve; {} age labels", config.age_labels.len()),
            elapsed: None,
        });
        let mut label_summaries = Vec::with_capacity(config.age_labels.len());
        let mut columns = Vec::with_capacity(config.age_labels.len());
        for label in &config.age_labels {
            let resolution =
                resolve_label(label.as_str(), &population, &female_ratios, &male_ratios)?;
            let aggregated_buckets = match &resolution {
                Resolution::Aggregated { run } => Some(
                    population.buckets()[run.clone()]
                        .iter()
                        .map(|bucket| bucket.label().to_string())
                        .collect(),
                ),
                _ => None,
            };
            info!(
                label = %label,
                strategy = strategy_name(resolution.strategy()),
                "age label resolved"
            );
            label_summaries.push(LabelSummary {
                label: label.to_string(),
                strategy: strategy_name(resolution.strategy()).to_string(),
                aggregated_buckets,
            });
            columns.push(apply_resolution(
                &resolution,
                &population,
                &female_ratios,
                &male_ratios,
            )?);
        }

        let mut rows: Vec<SexedRow> = population
            .rows()
            .iter()
            .enumerate()
            .map(|(idx, row)| SexedRow {
                location: row.location.clone(),
                sex: row.sex,
                values: columns.iter().map(|column| column[idx]).collect(),
            })
            .collect();

        progress.event(ProgressEvent {
            message: "phase=Normalize; converting to percentages".to_string(),
            elapsed: None,
        });
        let totals = population.location_totals();
        normalize(&mut rows, &totals);

        progress.event(ProgressEvent {
            message: "phase=Reconcile; resolving country identities".to_string(),
            elapsed: None,
        });
        let mut locations = Vec::new();
        for row in population.rows() {
            if !locations.contains(&row.location) {
                locations.push(row.location.clone());
            }
        }
        let mapping = resolve_locations(&locations, &reference, &config.overrides)?;
        let locations_dropped: Vec<String> = locations
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !mapping.contains_key(name))
            .collect();

        let output_rows = with_sex_totals(attach_identities(rows, &mapping));

        let output = if options.dry_run {
            None
        } else {
            progress.event(ProgressEvent {
                message: format!("phase=Write; {} rows", output_rows.len()),
                elapsed: None,
            });
            self.sink.write(&config.age_labels, &output_rows)?;
            Some(config.output.to_string())
        };

        Ok(RunSummary {
            labels: label_summaries,
            locations_resolved: mapping.len(),
            locations_dropped,
            rows: output_rows.len(),
            output,
        })
    }
}
