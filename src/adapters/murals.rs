use async_trait::async_trait;
use chrono::Datelike;
use serde::Deserialize;

use super::{coordinates_unsupported, date_note, or_na, or_unknown, string_or_number, today, DataAdapter, OpenDataClient, SearchQuery};
use crate::error::AdapterError;
use crate::location::{LocationFilter, ResolvedDates};
use crate::soql::WhereClause;
use crate::summary::Summary;

/// Mural registry dataset.
const DATASET: &str = "we8h-apcf";

#[derive(Debug, Deserialize)]
struct MuralRow {
    #[serde(default, deserialize_with = "string_or_number")]
    mural_registration_id:       Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    year_installed:              Option<String>,
    artist_credit:               Option<String>,
    artwork_title:               Option<String>,
    location_description:        Option<String>,
    street_address:              Option<String>,
    description:                 Option<String>,
    media:                       Option<String>,
    affiliated_or_commissioning: Option<String>,
}

/// Registered public murals. Only the installation year is recorded, so date
/// filters apply at year granularity.
pub struct MuralsAdapter {
    client:    OpenDataClient,
    max_chars: usize,
}

impl MuralsAdapter {
    pub fn new(client: OpenDataClient, max_chars: usize) -> Self {
        Self { client, max_chars }
    }
}

fn year_predicate(dates: &ResolvedDates) -> String {
    match dates {
        ResolvedDates::Between(start, end) => {
            format!("year_installed between {} and {}", start.year(), end.year())
        }
        ResolvedDates::Until(end) => format!("year_installed <= {}", end.year()),
    }
}

#[async_trait]
impl DataAdapter for MuralsAdapter {
    fn name(&self) -> &'static str {
        "public murals"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Summary, AdapterError> {
        let dates = query.resolved_dates(today())?;

        let mut filter = match &query.location {
            LocationFilter::ExactAddress(addr) => {
                let address = addr.full_address()
                    .ok_or_else(|| AdapterError::MissingLocation("an address is required".into()))?;
                WhereClause::new().eq("street_address", &address)
            }
            LocationFilter::BoundingBox(bbox) => WhereClause::new().within(bbox),
            LocationFilter::Coordinates(_)    => return Err(coordinates_unsupported()),
        };
        if let Some(d) = &dates {
            filter = filter.raw(year_predicate(d));
        }

        tracing::info!(location = %query.location, "retrieving public murals");
        let rows: Vec<MuralRow> = self.client.fetch(DATASET, &filter).await?;

        let place = format!("{}{}", query.location, date_note(&dates));
        if rows.is_empty() {
            return Ok(Summary::capped(format!("No murals found at {}.", place), self.max_chars));
        }

        let mut text = format!("Found {} mural(s) at {}:\n\n", rows.len(), place);
        for m in &rows {
            text.push_str(&format!("- Mural Registration ID #{}\n", or_na(&m.mural_registration_id)));
            text.push_str(&format!("  Year Installed: {}\n", or_unknown(&m.year_installed)));
            text.push_str(&format!("  Artist Credit: {}\n", or_unknown(&m.artist_credit)));
            text.push_str(&format!("  Artwork Title: {}\n", or_unknown(&m.artwork_title)));
            text.push_str(&format!("  Location Description: {}\n", or_unknown(&m.location_description)));
            text.push_str(&format!("  Street Address: {}\n", or_unknown(&m.street_address)));
            text.push_str(&format!("  Description: {}\n", or_unknown(&m.description)));
            text.push_str(&format!("  Media: {}\n", or_unknown(&m.media)));
            text.push_str(&format!("  Organization: {}\n", or_unknown(&m.affiliated_or_commissioning)));
        }
        Ok(Summary::capped(text, self.max_chars))
    }
}
