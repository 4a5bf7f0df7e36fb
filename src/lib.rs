pub mod types;
pub mod memory;
pub mod trace;
pub mod error;
pub mod config;
pub mod proximity;
pub mod location;
pub mod soql;
pub mod summary;
pub mod geocoder;
pub mod adapters;
pub mod tools;
pub mod llm;
pub mod prompt;
pub mod engine;
pub mod builder;

// Convenience re-exports at crate root
pub use builder::InvestigatorBuilder;
pub use engine::Investigator;
pub use memory::Transcript;
pub use types::{Phase, LlmResponse, ToolCall, HistoryEntry, TokenUsage};
pub use proximity::{compute_bounding_box, BoundingBox, Coordinate, RadiusQuery};
pub use location::{DateRange, ExactAddress, LocationFilter};
pub use tools::{Tool, ToolRegistry};
pub use llm::{LlmCaller, RetryingLlmCaller};
pub use trace::{TraceEntry, Trace};
pub use config::Settings;
pub use error::{AdapterError, AgentError, GeocodingError, ProximityError};
