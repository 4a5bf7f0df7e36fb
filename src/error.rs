use thiserror::Error;

/// Caller errors rejected by the proximity engine before any trigonometry runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProximityError {
    #[error("Invalid coordinate: latitude {latitude} must be in [-90, 90] and longitude {longitude} in [-180, 180]")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Invalid radius: {0} miles (must be a positive finite number)")]
    InvalidRadius(f64),

    #[error("Latitude {0} is too close to a pole for a longitude correction")]
    DegeneratePole(f64),
}

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("No location found for address '{0}'")]
    NotFound(String),

    #[error("Geocoder unavailable after {attempts} attempt(s): {last}")]
    Unavailable { attempts: u32, last: String },

    #[error("Geocoder returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Geocoder response could not be parsed: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Error retrieving data: {status}")]
    Status { status: u16 },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unsupported location: {0}")]
    UnsupportedLocation(String),

    #[error("Missing location: {0}")]
    MissingLocation(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent failed: {0}")]
    AgentFailed(String),

    #[error("Step limit of {0} reached without a final answer")]
    MaxSteps(usize),

    #[error("LLM caller error: {0}")]
    LlmError(String),

    #[error("Build error: {0}")]
    BuildError(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
