//! One adapter per city dataset. Each turns a [`SearchQuery`] into a SoQL
//! request and formats the matching rows into a capped [`Summary`].

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AdapterError;
use crate::location::{DateRange, LocationFilter, ResolvedDates};
use crate::summary::Summary;

mod client;
mod food;
mod murals;
mod permits;
mod violations;

pub use client::OpenDataClient;
pub use food::FoodInspectionsAdapter;
pub use murals::MuralsAdapter;
pub use permits::PermitsAdapter;
pub use violations::ViolationsAdapter;

/// Location, optional dates and the optional food-inspection refinements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub location:      LocationFilter,
    #[serde(default)]
    pub dates:         DateRange,
    /// Business ("doing business as") name, upper-cased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    /// Inspection outcome such as `Pass` or `Fail`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result:        Option<String>,
}

impl SearchQuery {
    pub fn new(location: LocationFilter) -> Self {
        Self { location, dates: DateRange::any(), business_name: None, result: None }
    }

    pub fn with_dates(mut self, dates: DateRange) -> Self {
        self.dates = dates; self
    }

    pub fn with_business_name(mut self, name: impl Into<String>) -> Self {
        self.business_name = Some(name.into()); self
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into()); self
    }

    pub(crate) fn resolved_dates(&self, today: NaiveDate) -> Result<Option<ResolvedDates>, AdapterError> {
        self.dates.resolve(today)
    }
}

/// A read-only search over one open dataset.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataAdapter: Send + Sync {
    /// Short dataset label used in logs and tool descriptions.
    fn name(&self) -> &'static str;

    async fn search(&self, query: &SearchQuery) -> Result<Summary, AdapterError>;
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn date_note(dates: &Option<ResolvedDates>) -> String {
    match dates {
        Some(ResolvedDates::Between(start, end)) => format!(" between {} and {}", start, end),
        Some(ResolvedDates::Until(end))          => format!(" up to {}", end),
        None                                     => String::new(),
    }
}

fn coordinates_unsupported() -> AdapterError {
    AdapterError::UnsupportedLocation(
        "a single coordinate cannot be searched; compute coordinate boundaries with \
         get_proximity_to_coords first".to_string(),
    )
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("Unknown")
}

fn or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

/// Socrata serializes numbers as strings, but not every export does.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    })
}
