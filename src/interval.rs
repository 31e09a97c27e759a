use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SaddError;

/// Upper bound of an age interval. Open-ended buckets such as `65+` carry no
/// numeric upper bound, so infinity is a variant rather than a sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeBound {
    Finite(u32),
    Unbounded,
}

/// A half-open or closed interval over non-negative integer ages, written
/// `lo-hi` or `lo+`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgeInterval {
    pub lower: u32,
    pub upper: AgeBound,
}

impl fmt::Display for AgeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            AgeBound::Finite(hi) => write!(f, "{}-{}", self.lower, hi),
            AgeBound::Unbounded => write!(f, "{}+", self.lower),
        }
    }
}

impl FromStr for AgeInterval {
    type Err = SaddError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(lower) = trimmed.strip_suffix('+') {
            let lower = parse_bound(lower, value)?;
            return Ok(Self {
                lower,
                upper: AgeBound::Unbounded,
            });
        }
        let (lower, upper) = trimmed
            .split_once('-')
            .ok_or_else(|| SaddError::InvalidAgeLabel(value.to_string()))?;
        let lower = parse_bound(lower, value)?;
        let upper = parse_bound(upper, value)?;
        if upper < lower {
            return Err(SaddError::InvalidAgeLabel(value.to_string()));
        }
        Ok(Self {
            lower,
            upper: AgeBound::Finite(upper),
        })
    }
}

fn parse_bound(text: &str, original: &str) -> Result<u32, SaddError> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| SaddError::InvalidAgeLabel(original.to_string()))
}

/// A requested age label: the literal string the caller asked for plus its
/// parsed interval. Direct and ratio-derived matching compare the raw string
/// against source column names; aggregation matching compares parsed bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeLabel {
    raw: String,
    interval: AgeInterval,
}

impl AgeLabel {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn interval(&self) -> AgeInterval {
        self.interval
    }
}

impl fmt::Display for AgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for AgeLabel {
    type Err = SaddError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = value.trim().to_string();
        let interval = raw.parse()?;
        Ok(Self { raw, interval })
    }
}
