use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;
use crate::proximity::{BoundingBox, Coordinate};

/// A street address in the upper-cased form the city datasets store.
///
/// Either the full `address` (`1601 W CHICAGO AVE`) or its components may be
/// supplied. Datasets keyed on components fall back to parsing `address`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExactAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address:          Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_number:     Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street:           Option<String>,
}

/// House number, single-letter direction and street name of an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressComponents {
    pub house_number: String,
    pub direction:    String,
    pub street:       String,
}

impl ExactAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: Some(address.into()), ..Default::default() }
    }

    /// The full address line, rebuilt from components if only those were given.
    pub fn full_address(&self) -> Option<String> {
        if let Some(address) = self.address.as_deref().filter(|a| !a.trim().is_empty()) {
            return Some(address.trim().to_string());
        }
        let parts: Vec<&str> = [&self.house_number, &self.street_direction, &self.street]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// Returns explicit components when all three are present, otherwise
    /// parses `address` as `<number> <direction> <street ...>`. The direction
    /// may be spelled out or abbreviated with a period (`WEST`, `W.`).
    pub fn components(&self) -> Option<AddressComponents> {
        if let (Some(house_number), Some(direction), Some(street)) =
            (&self.house_number, &self.street_direction, &self.street)
        {
            return Some(AddressComponents {
                house_number: house_number.trim().to_string(),
                direction:    street_direction(direction)?.to_string(),
                street:       street.trim().to_string(),
            });
        }

        let address = self.address.as_deref()?;
        let mut words = address.split_whitespace();
        let house_number = words.next().filter(|w| w.chars().all(|c| c.is_ascii_digit()))?;
        let direction = words.next().and_then(street_direction)?;
        let street: Vec<&str> = words.collect();
        if street.is_empty() {
            return None;
        }
        Some(AddressComponents {
            house_number: house_number.to_string(),
            direction:    direction.to_string(),
            street:       street.join(" "),
        })
    }
}

/// One-letter form of a street direction as the permit dataset stores it.
fn street_direction(word: &str) -> Option<&'static str> {
    match word.trim().trim_end_matches('.').to_ascii_uppercase().as_str() {
        "N" | "NORTH" => Some("N"),
        "S" | "SOUTH" => Some("S"),
        "E" | "EAST"  => Some("E"),
        "W" | "WEST"  => Some("W"),
        _ => None,
    }
}

/// Where an adapter should look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "location_type", content = "value", rename_all = "snake_case")]
pub enum LocationFilter {
    ExactAddress(ExactAddress),
    Coordinates(Coordinate),
    #[serde(rename = "coordinate_boundaries")]
    BoundingBox(BoundingBox),
}

impl std::fmt::Display for LocationFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            LocationFilter::ExactAddress(a) => {
                write!(f, "{}", a.full_address().unwrap_or_else(|| "an unspecified address".to_string()))
            }
            LocationFilter::Coordinates(c) => write!(f, "{}", c),
            LocationFilter::BoundingBox(b) => write!(f, "{}", b),
        }
    }
}

/// Optional start/end dates as supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end:   Option<NaiveDate>,
}

/// The concrete bounds a date predicate is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedDates {
    Between(NaiveDate, NaiveDate),
    Until(NaiveDate),
}

impl DateRange {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start: Some(start), end: Some(end) }
    }

    pub fn since(start: NaiveDate) -> Self {
        Self { start: Some(start), end: None }
    }

    /// Parses optional `YYYY-MM-DD` strings. Blank strings count as absent.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, AdapterError> {
        Ok(Self { start: parse_date(start)?, end: parse_date(end)? })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// A start with no end runs through `today`.
    pub fn resolve(&self, today: NaiveDate) -> Result<Option<ResolvedDates>, AdapterError> {
        match (self.start, self.end) {
            (Some(start), end) => {
                let end = end.unwrap_or(today);
                if start > end {
                    return Err(AdapterError::InvalidDateRange {
                        start: start.to_string(),
                        end:   end.to_string(),
                    });
                }
                Ok(Some(ResolvedDates::Between(start, end)))
            }
            (None, Some(end)) => Ok(Some(ResolvedDates::Until(end))),
            (None, None) => Ok(None),
        }
    }
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, AdapterError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AdapterError::InvalidDate(s.to_string())),
    }
}
