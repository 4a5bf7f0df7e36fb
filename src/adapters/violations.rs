use async_trait::async_trait;
use serde::Deserialize;

use super::{coordinates_unsupported, date_note, or_na, or_unknown, today, DataAdapter, OpenDataClient, SearchQuery};
use crate::error::AdapterError;
use crate::location::LocationFilter;
use crate::soql::WhereClause;
use crate::summary::Summary;

/// Building violations dataset.
const DATASET: &str = "22u3-xenr";

#[derive(Debug, Deserialize)]
struct ViolationRow {
    id:                           Option<String>,
    violation_date:               Option<String>,
    address:                      Option<String>,
    inspection_status:            Option<String>,
    inspection_number:            Option<String>,
    violation_status:             Option<String>,
    violation_description:        Option<String>,
    violation_inspector_comments: Option<String>,
}

/// Building code violations recorded by failed inspections.
pub struct ViolationsAdapter {
    client:    OpenDataClient,
    max_chars: usize,
}

impl ViolationsAdapter {
    pub fn new(client: OpenDataClient, max_chars: usize) -> Self {
        Self { client, max_chars }
    }

    /// Full record of one violation, by the number a search returned.
    pub async fn details(&self, violation_id: &str) -> Result<Summary, AdapterError> {
        tracing::info!(violation_id, "retrieving violation details");
        let filter = WhereClause::new().eq("id", violation_id.trim());
        let rows: Vec<ViolationRow> = self.client.fetch(DATASET, &filter).await?;

        let Some(record) = rows.into_iter().next() else {
            return Ok(Summary::capped(
                format!("No inspection found with number {}", violation_id),
                self.max_chars,
            ));
        };

        let mut text = format!("Violation #{} Details:\n", violation_id);
        text.push_str(&format!("Inspection #{}\n\n", or_na(&record.inspection_number)));
        text.push_str(&format!("Address: {}\n", or_na(&record.address)));
        text.push_str(&format!("Status: {}\n", or_na(&record.inspection_status)));
        text.push_str(&format!("Violation Status: {}\n", or_na(&record.violation_status)));
        text.push_str(&format!("Violation Date: {}\n", or_na(&record.violation_date)));
        text.push_str(&format!("Inspector Comments: {}\n", or_na(&record.violation_inspector_comments)));
        text.push_str(&format!("Violation Description: {}\n\n", or_na(&record.violation_description)));
        text.push_str(
            "Violation status notes: Open means it has not been remedied, \
             Complied means it has been remedied.",
        );
        text.push_str(&format!("\nToday's date is {}", today().format("%Y-%m-%d")));

        Ok(Summary::capped(text, self.max_chars))
    }
}

#[async_trait]
impl DataAdapter for ViolationsAdapter {
    fn name(&self) -> &'static str {
        "building violations"
    }

    async fn search(&self, query: &SearchQuery) -> Result<Summary, AdapterError> {
        let dates = query.resolved_dates(today())?;

        let (mut filter, by_box) = match &query.location {
            LocationFilter::ExactAddress(addr) => {
                let address = addr.full_address()
                    .ok_or_else(|| AdapterError::MissingLocation("an address is required".into()))?;
                (WhereClause::new().eq("address", &address), false)
            }
            LocationFilter::BoundingBox(bbox) => (WhereClause::new().within(bbox), true),
            LocationFilter::Coordinates(_)    => return Err(coordinates_unsupported()),
        };
        if let Some(d) = &dates {
            filter = filter.dates("violation_date", d);
        }

        tracing::info!(location = %query.location, "retrieving building violations");
        let rows: Vec<ViolationRow> = self.client.fetch(DATASET, &filter).await?;
        let failed: Vec<&ViolationRow> = rows.iter()
            .filter(|r| r.inspection_status.as_deref() == Some("FAILED"))
            .collect();

        let place = format!("{}{}", query.location, date_note(&dates));
        if failed.is_empty() {
            return Ok(Summary::capped(format!("No violations found at {}.", place), self.max_chars));
        }

        let mut text = format!("Found {} violation(s) at {}:\n\n", failed.len(), place);
        for v in failed {
            text.push_str(&format!("- Violation #{}\n", or_na(&v.id)));
            text.push_str(&format!("  Date: {}\n", or_unknown(&v.violation_date)));
            if by_box {
                text.push_str(&format!("  Address: {}\n", or_unknown(&v.address)));
            }
        }
        Ok(Summary::capped(text, self.max_chars))
    }
}
