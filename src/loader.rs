use std::fs;

use regex::Regex;

use crate::config::DatasetPaths;
use crate::error::SaddError;
use crate::table::{
    PopulationRow, PopulationTable, RatioRow, RatioTable, ReferenceRow, ReferenceTable, Sex,
};

/// Supplier of the four input tables. The pipeline only sees this trait, so
/// tests substitute in-memory sources for the CSV files.
pub trait DatasetSource {
    fn load_population(&self) -> Result<PopulationTable, SaddError>;
    fn load_female_ratios(&self) -> Result<RatioTable, SaddError>;
    fn load_male_ratios(&self) -> Result<RatioTable, SaddError>;
    fn load_reference(&self) -> Result<ReferenceTable, SaddError>;
}

/// CSV exports of the UN population workbooks. The population and ratio files
/// carry one leading metadata line before the header; the reference file
/// starts at the header.
#[derive(Debug, Clone)]
pub struct CsvDatasetSource {
    paths: DatasetPaths,
}

impl CsvDatasetSource {
    pub fn new(paths: DatasetPaths) -> Self {
        Self { paths }
    }
}

impl DatasetSource for CsvDatasetSource {
    fn load_population(&self) -> Result<PopulationTable, SaddError> {
        let sheet = DataSheet::read(&self.paths.population)?;
        let mut rows = Vec::new();
        for record in &sheet.records {
            let Some(sex) = sheet.parse_sex(record)? else {
                continue;
            };
            rows.push(PopulationRow {
                location: sheet.location(record),
                sex,
                counts: sheet.age_values(record)?,
            });
        }
        PopulationTable::new(&sheet.age_labels, rows)
    }

    fn load_female_ratios(&self) -> Result<RatioTable, SaddError> {
        load_ratios(&self.paths.female_ratios)
    }

    fn load_male_ratios(&self) -> Result<RatioTable, SaddError> {
        load_ratios(&self.paths.male_ratios)
    }

    fn load_reference(&self) -> Result<ReferenceTable, SaddError> {
        let path = self.paths.reference.as_str();
        let content = fs::read_to_string(path).map_err(|err| SaddError::DatasetRead {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .map_err(|err| SaddError::DatasetParse {
                path: path.to_string(),
                message: err.to_string(),
            })?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| SaddError::MissingColumn {
                    path: path.to_string(),
                    column: name.to_string(),
                })
        };
        let full_name = column("idmc_full_name")?;
        let short_name = column("idmc_short_name")?;
        let iso3 = column("iso3")?;
        let region = column("GRID_geographical_group")?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| SaddError::DatasetParse {
                path: path.to_string(),
                message: err.to_string(),
            })?;
            let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
            rows.push(ReferenceRow {
                full_name: field(full_name),
                short_name: field(short_name),
                iso3: field(iso3),
                region: field(region),
            });
        }
        Ok(ReferenceTable::new(rows))
    }
}

fn load_ratios(path: &str) -> Result<RatioTable, SaddError> {
    let sheet = DataSheet::read(path)?;
    let mut rows = Vec::new();
    for record in &sheet.records {
        if sheet.parse_sex(record)?.is_none() {
            continue;
        }
        rows.push(RatioRow {
            location: sheet.location(record),
            shares: sheet.age_values(record)?,
        });
    }
    RatioTable::new(&sheet.age_labels, rows)
}

/// A parsed population-style sheet: Location and Sex columns plus the age
/// columns, which are the headers containing no alphabetic character.
struct DataSheet {
    path: String,
    location_idx: usize,
    sex_idx: usize,
    age_indices: Vec<usize>,
    age_labels: Vec<String>,
    records: Vec<csv::StringRecord>,
}

impl DataSheet {
    fn read(path: &str) -> Result<Self, SaddError> {
        let content = fs::read_to_string(path).map_err(|err| SaddError::DatasetRead {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        // One leading metadata line before the real header.
        let body = match content.split_once('\n') {
            Some((_, rest)) => rest,
            None => "",
        };
        let mut reader = csv::Reader::from_reader(body.as_bytes());
        let headers = reader
            .headers()
            .map_err(|err| SaddError::DatasetParse {
                path: path.to_string(),
                message: err.to_string(),
            })?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| SaddError::MissingColumn {
                    path: path.to_string(),
                    column: name.to_string(),
                })
        };
        let location_idx = column("Location")?;
        let sex_idx = column("Sex")?;

        let alphabetic = Regex::new("[a-zA-Z]").map_err(|err| SaddError::DatasetParse {
            path: path.to_string(),
            message: err.to_string(),
        })?;
        let mut age_indices = Vec::new();
        let mut age_labels = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            let header = header.trim();
            if header.is_empty() || alphabetic.is_match(header) {
                continue;
            }
            age_indices.push(idx);
            age_labels.push(header.to_string());
        }
        if age_labels.is_empty() {
            return Err(SaddError::DatasetParse {
                path: path.to_string(),
                message: "no age bucket columns found".to_string(),
            });
        }

        let mut records = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| SaddError::DatasetParse {
                path: path.to_string(),
                message: err.to_string(),
            })?;
            records.push(record);
        }

        Ok(Self {
            path: path.to_string(),
            location_idx,
            sex_idx,
            age_indices,
            age_labels,
            records,
        })
    }

    fn location(&self, record: &csv::StringRecord) -> String {
        record.get(self.location_idx).unwrap_or_default().to_string()
    }

    /// Returns `None` for rows with an empty Sex field, which are excluded by
    /// convention (sheet-level subtotal lines).
    fn parse_sex(&self, record: &csv::StringRecord) -> Result<Option<Sex>, SaddError> {
        let raw = record.get(self.sex_idx).unwrap_or_default().trim();
        match raw {
            "" => Ok(None),
            "Female" => Ok(Some(Sex::Female)),
            "Male" => Ok(Some(Sex::Male)),
            other => Err(SaddError::DatasetParse {
                path: self.path.clone(),
                message: format!("unrecognized Sex value {other:?}"),
            }),
        }
    }

    /// Age column values in header order. Empty cells read as NaN so gaps
    /// propagate as unknowns instead of zeros.
    fn age_values(&self, record: &csv::StringRecord) -> Result<Vec<f64>, SaddError> {
        self.age_indices
            .iter()
            .map(|&idx| {
                let cell = record.get(idx).unwrap_or_default().trim();
                if cell.is_empty() {
                    return Ok(f64::NAN);
                }
                cell.parse::<f64>().map_err(|_| SaddError::DatasetParse {
                    path: self.path.clone(),
                    message: format!("unparsable numeric cell {cell:?}"),
                })
            })
            .collect()
    }
}
