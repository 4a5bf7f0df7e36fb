use async_trait::async_trait;
use serde::Deserialize;

use super::{coordinates_unsupported, date_note, or_unknown, today, DataAdapter, OpenDataClient, SearchQuery};
use crate::error::AdapterError;
use crate::location::LocationFilter;
use crate::soql::WhereClause;
use crate::summary::Summary;

/// Food inspections dataset.
const DATASET: &str = "4ijn-s7e5";

#[derive(Debug, Deserialize)]
struct InspectionRow {
    dba_name:        Option<String>,
    address:         Option<String>,
    results:         Option<String>,
    inspection_date: Option<String>,
    violations:      Option<String>,
    risk:            Option<String>,
}

/// Health department inspections of restaurants and other food services.
pub struct FoodInspectionsAdapter {
    client:    OpenDataClient,
    max_chars: usize,
}

impl FoodInspectionsAdapter {
    pub fn new(client: OpenDataClient, max_chars: usize) -> Self {
        Self { client, max_chars }
    }

    fn location_filter(query: &SearchQuery) -> Result<(WhereClause, String), AdapterError> {
        let name = query.business_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        match &query.location {
            LocationFilter::BoundingBox(bbox) => {
                let mut filter = WhereClause::new().within(bbox);
                if let Some(name) = name {
                    filter = filter.eq("dba_name", name);
                }
                Ok((filter, query.location.to_string()))
            }
            LocationFilter::ExactAddress(addr) => {
                let address = addr.full_address();
                if name.is_none() && address.is_none() {
                    return Err(AdapterError::MissingLocation(
                        "either name, coordinates, or address is necessary to find a restaurant".into(),
                    ));
                }
                let mut filter = WhereClause::new();
                if let Some(name) = name {
                    filter = filter.eq("dba_name", name);
                }
                if let Some(address) = &address {
                    filter = filter.eq("address", address);
                }
                let label = [name, address.as_deref()].into_iter().flatten().collect::<Vec<_>>().join(" ");
                Ok((filter, label))
            }
            LocationFilter::Coordinates(_) => Err(coordinates_unsupported()),
        }
    }
}

#[async_trait]
impl DataAdapter for FoodInspectionsAdapter {
    fn name(&self) -> &'static str {
        "food inspections"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Summary, AdapterError> {
        let dates = query.resolved_dates(today())?;
        let (mut filter, label) = Self::location_filter(query)?;
        if let Some(d) = &dates {
            filter = filter.dates("inspection_date", d);
        }
        if let Some(result) = query.result.as_deref().filter(|r| !r.trim().is_empty()) {
            filter = filter.eq("results", result.trim());
        }

        tracing::info!(target_label = %label, "retrieving food inspections");
        let rows: Vec<InspectionRow> = self.client.fetch(DATASET, &filter).await?;

        let place = format!("{}{}", label, date_note(&dates));
        if rows.is_empty() {
            return Ok(Summary::capped(format!("No inspections found for {}.", place), self.max_chars));
        }

        let mut text = format!("Found {} inspections for {}:\n\n", rows.len(), place);
        for r in &rows {
            text.push_str(&format!("  Business name: {}\n", or_unknown(&r.dba_name)));
            text.push_str(&format!("  Business address: {}\n", or_unknown(&r.address)));
            text.push_str(&format!("  Results: {}\n", or_unknown(&r.results)));
            text.push_str(&format!("  Date: {}\n", or_unknown(&r.inspection_date)));
            text.push_str(&format!("  Violation: {}\n", or_unknown(&r.violations)));
            text.push_str(&format!("  Risk Level: {}\n", or_unknown(&r.risk)));
            text.push('\n');
        }
        Ok(Summary::capped(text, self.max_chars))
    }
}
