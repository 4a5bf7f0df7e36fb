use crate::tools::ToolRegistry;

/// Asked when the CLI gets no `--query`.
pub const DEFAULT_QUERY: &str = "Find all the building code violations from 2025 within .1 mile of \
    1751 West Augusta Blvd, and check and see if any of the addresses have active building permits. \
    Tell me what the violations are, and list the building permits so I can see if the permits \
    might be remediating the violations.";

const PREAMBLE: &str = "You are a research assistant helping users find information about buildings \
in Chicago, Illinois. Users submit an address, and possibly a date or date range to look for.";

const CONVENTIONS: &str = "\
Formatting rules for tool arguments:
- Addresses are all caps, with cardinal directions as one letter (N for North) and street types \
abbreviated (BLVD for Boulevard, AVE for Avenue, ST for Street).
- Restaurant and business names are all caps.
- Dates are YYYY-MM-DD.
- For questions about the vicinity of an address, geocode it, compute coordinate boundaries with \
get_proximity_to_coords, then search with location_type coordinate_boundaries. For the address \
itself, search with location_type exact_address.";

const CLOSING: &str = "Use multiple tools when helpful to provide comprehensive answers. Do not ask \
follow up questions or offer to do more. If results had to be truncated due to length, let the user know.";

/// The system prompt: preamble, a numbered catalog of the registered tools,
/// and the argument conventions the data sources expect.
pub fn system_prompt(tools: &ToolRegistry) -> String {
    let catalog: Vec<String> = tools.schemas()
        .iter()
        .enumerate()
        .map(|(i, schema)| format!("{}. {} - {}", i + 1, schema.name, schema.description))
        .collect();

    format!(
        "{PREAMBLE}\n\n{CONVENTIONS}\n\nAvailable tools:\n{}\n\n{CLOSING}",
        catalog.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ProximityTool;

    #[test]
    fn test_prompt_lists_registered_tools() {
        let mut tools = ToolRegistry::new();
        tools.register(ProximityTool);
        let prompt = system_prompt(&tools);

        assert!(prompt.contains("1. get_proximity_to_coords - "));
        assert!(prompt.contains("all caps"));
        assert!(prompt.contains("Do not ask follow up questions"));
        assert!(prompt.contains("truncated"));
    }
}
