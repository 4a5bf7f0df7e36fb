//! `$where` predicates for the city's Socrata open-data endpoints.

use crate::location::ResolvedDates;
use crate::proximity::BoundingBox;

/// Conjunction of SoQL predicates, rendered with ` AND ` between terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereClause {
    terms: Vec<String>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// `latitude between south and north AND longitude between west and east`
    pub fn within(mut self, bbox: &BoundingBox) -> Self {
        self.terms.push(format!(
            "latitude between {} and {} AND longitude between {} and {}",
            bbox.south, bbox.north, bbox.west, bbox.east
        ));
        self
    }

    pub fn eq(mut self, field: &str, value: &str) -> Self {
        self.terms.push(format!("{}={}", field, quote(value)));
        self
    }

    /// Whole-day bounds on a floating timestamp column.
    pub fn dates(mut self, field: &str, dates: &ResolvedDates) -> Self {
        let term = match dates {
            ResolvedDates::Between(start, end) => format!(
                "{} between '{}T00:00:00' and '{}T23:59:59'",
                field,
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
            ResolvedDates::Until(end) => {
                format!("{} <= '{}T23:59:59'", field, end.format("%Y-%m-%d"))
            }
        };
        self.terms.push(term);
        self
    }

    pub fn raw(mut self, predicate: impl Into<String>) -> Self {
        self.terms.push(predicate.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn build(&self) -> String {
        self.terms.join(" AND ")
    }
}

impl std::fmt::Display for WhereClause {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}

/// SoQL string literal; embedded single quotes are doubled.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
