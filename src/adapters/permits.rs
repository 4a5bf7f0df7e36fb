use async_trait::async_trait;
use serde::Deserialize;

use super::{coordinates_unsupported, date_note, or_na, or_unknown, today, DataAdapter, OpenDataClient, SearchQuery};
use crate::error::AdapterError;
use crate::location::LocationFilter;
use crate::soql::WhereClause;
use crate::summary::Summary;

/// Building permits dataset.
const DATASET: &str = "ydr8-5enu";

#[derive(Debug, Deserialize)]
struct PermitRow {
    #[serde(rename = "permit_", alias = "permit#")]
    permit_number:    Option<String>,
    permit_status:    Option<String>,
    permit_type:      Option<String>,
    issue_date:       Option<String>,
    work_description: Option<String>,
    contact_1_name:   Option<String>,
    street_number:    Option<String>,
    street_direction: Option<String>,
    street_name:      Option<String>,
}

impl PermitRow {
    fn address(&self) -> String {
        [&self.street_number, &self.street_direction, &self.street_name]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Active building permits, by address components or area.
pub struct PermitsAdapter {
    client:    OpenDataClient,
    max_chars: usize,
}

impl PermitsAdapter {
    pub fn new(client: OpenDataClient, max_chars: usize) -> Self {
        Self { client, max_chars }
    }
}

#[async_trait]
impl DataAdapter for PermitsAdapter {
    fn name(&self) -> &'static str {
        "active building permits"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Summary, AdapterError> {
        let dates = query.resolved_dates(today())?;

        let (mut filter, by_box) = match &query.location {
            LocationFilter::ExactAddress(addr) => {
                let parts = addr.components().ok_or_else(|| AdapterError::MissingLocation(
                    "permits need a house number, a one-letter street direction and a street name \
                     (e.g. 1601 W CHICAGO AVE)".into(),
                ))?;
                let filter = WhereClause::new()
                    .eq("street_name", &parts.street)
                    .eq("street_number", &parts.house_number)
                    .eq("street_direction", &parts.direction);
                (filter, false)
            }
            LocationFilter::BoundingBox(bbox) => (WhereClause::new().within(bbox), true),
            LocationFilter::Coordinates(_)    => return Err(coordinates_unsupported()),
        };
        if let Some(d) = &dates {
            filter = filter.dates("issue_date", d);
        }

        tracing::info!(location = %query.location, "retrieving active permits");
        let rows: Vec<PermitRow> = self.client.fetch(DATASET, &filter).await?;
        let active: Vec<&PermitRow> = rows.iter()
            .filter(|r| r.permit_status.as_deref() == Some("ACTIVE"))
            .collect();

        let place = format!("{}{}", query.location, date_note(&dates));
        if active.is_empty() {
            return Ok(Summary::capped(format!("No active permits found for {}.", place), self.max_chars));
        }

        let mut text = format!("Found {} active permit(s) issued for {}:\n\n", active.len(), place);
        for p in active {
            text.push_str(&format!("- Permit #{}\n", or_na(&p.permit_number)));
            text.push_str(&format!("  Permit Type: {}\n", or_na(&p.permit_type)));
            text.push_str(&format!("  Date: {}\n", or_unknown(&p.issue_date)));
            text.push_str(&format!("  Work Description: {}\n", or_unknown(&p.work_description)));
            text.push_str(&format!("  Issued To: {}\n", or_unknown(&p.contact_1_name)));
            if by_box {
                text.push_str(&format!("  Address: {}\n", p.address()));
            }
            text.push('\n');
        }
        Ok(Summary::capped(text, self.max_chars))
    }
}
