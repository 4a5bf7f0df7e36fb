use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{str_arg, Tool, ToolArgs};
use crate::adapters::{DataAdapter, SearchQuery, ViolationsAdapter};
use crate::location::{DateRange, ExactAddress, LocationFilter};

/// Exposes one [`DataAdapter`] as a tool taking a location filter and dates.
pub struct SearchTool {
    name:        &'static str,
    description: &'static str,
    adapter:     Arc<dyn DataAdapter>,
    /// Accepts `business_name` and `result` arguments.
    refinements: bool,
}

impl SearchTool {
    pub fn new(name: &'static str, description: &'static str, adapter: Arc<dyn DataAdapter>) -> Self {
        Self { name, description, adapter, refinements: false }
    }

    pub fn with_refinements(mut self) -> Self {
        self.refinements = true; self
    }

    pub fn violations(adapter: Arc<dyn DataAdapter>) -> Self {
        Self::new(
            "search_violations",
            "Get building code violations (failed inspections) for an exact address or within \
             coordinate boundaries, with optional start_date/end_date filtering. Returns violation \
             numbers and dates; use get_violation_details for a description of each.",
            adapter,
        )
    }

    pub fn permits(adapter: Arc<dyn DataAdapter>) -> Self {
        Self::new(
            "search_active_building_permits",
            "Get active building permits for an exact address (house number, one-letter street \
             direction and street name) or within coordinate boundaries. Dates filter on the \
             permit issue date.",
            adapter,
        )
    }

    pub fn food_inspections(adapter: Arc<dyn DataAdapter>) -> Self {
        Self::new(
            "search_food_inspections",
            "Get health department inspections of restaurants and food services by business name \
             and/or exact address, or within coordinate boundaries. Optionally filter by result \
             ('Pass', 'Fail', 'Pass w/ Conditions') and inspection dates.",
            adapter,
        )
        .with_refinements()
    }

    pub fn murals(adapter: Arc<dyn DataAdapter>) -> Self {
        Self::new(
            "search_murals",
            "Get registered public art murals at an exact address or within coordinate \
             boundaries. Dates filter on the year the mural was installed.",
            adapter,
        )
    }

    fn query(&self, args: &ToolArgs) -> Result<SearchQuery, String> {
        let location = match args.get("location") {
            None | Some(Value::Null) => LocationFilter::ExactAddress(ExactAddress::default()),
            Some(value) => parse_location(value)?,
        };
        let dates = DateRange::parse(str_arg(args, "start_date"), str_arg(args, "end_date"))
            .map_err(|e| e.to_string())?;

        let mut query = SearchQuery::new(location).with_dates(dates);
        if self.refinements {
            query.business_name = str_arg(args, "business_name").map(str::to_uppercase);
            query.result = str_arg(args, "result").map(str::to_string);
        }
        Ok(query)
    }
}

/// Accepts the tagged object, or the same object serialized as a string.
fn parse_location(value: &Value) -> Result<LocationFilter, String> {
    let parsed = match value {
        Value::String(raw) => serde_json::from_str(raw),
        other              => serde_json::from_value(other.clone()),
    };
    parsed.map_err(|e| format!("Malformed location: {}", e))
}

fn location_schema() -> Value {
    json!({
        "type": "object",
        "description": "Where to search. exact_address: value has 'address' (e.g. '1601 W CHICAGO AVE') \
                        and optionally 'house_number', 'street_direction', 'street'. \
                        coordinate_boundaries: value is the {north, south, east, west} object \
                        returned by get_proximity_to_coords.",
        "properties": {
            "location_type": {
                "type": "string",
                "enum": ["exact_address", "coordinate_boundaries", "coordinates"]
            },
            "value": { "type": "object" }
        },
        "required": ["location_type", "value"]
    })
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn input_schema(&self) -> Value {
        let mut schema = json!({
            "type": "object",
            "properties": {
                "location":   location_schema(),
                "start_date": { "type": "string", "description": "Optional start date, YYYY-MM-DD" },
                "end_date":   { "type": "string", "description": "Optional end date, YYYY-MM-DD" }
            },
            "required": ["location"]
        });
        if self.refinements {
            schema["properties"]["business_name"] =
                json!({ "type": "string", "description": "Optional business name, all caps" });
            schema["properties"]["result"] =
                json!({ "type": "string", "description": "Optional inspection result, e.g. 'Pass' or 'Fail'" });
            schema["required"] = json!([]);
        }
        schema
    }

    async fn invoke(&self, args: &ToolArgs) -> Result<String, String> {
        let query = self.query(args)?;
        tracing::debug!(adapter = self.adapter.name(), ?query, "search request");
        self.adapter
            .search(&query)
            .await
            .map(|summary| summary.into_string())
            .map_err(|e| e.to_string())
    }
}

/// `get_violation_details`: one violation number → full record.
pub struct ViolationDetailsTool {
    adapter: Arc<ViolationsAdapter>,
}

impl ViolationDetailsTool {
    pub fn new(adapter: Arc<ViolationsAdapter>) -> Self {
        Self { adapter }
    }
}

#[async_trait]
impl Tool for ViolationDetailsTool {
    fn name(&self) -> &str {
        "get_violation_details"
    }

    fn description(&self) -> &str {
        "Get the inspector comments, description and open/complied status of one building code \
         violation. Submit one violation number at a time."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "violation_id_number": {
                    "type": "string",
                    "description": "Violation number from a previous search, e.g. '12345678'"
                }
            },
            "required": ["violation_id_number"]
        })
    }

    async fn invoke(&self, args: &ToolArgs) -> Result<String, String> {
        let id = match args.get("violation_id_number") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err("violation_id_number is required".to_string()),
        };
        self.adapter
            .details(&id)
            .await
            .map(|summary| summary.into_string())
            .map_err(|e| e.to_string())
    }
}
