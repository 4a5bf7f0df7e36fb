use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub step:      usize,
    pub phase:     String,
    pub event:     String,
    pub data:      String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only log of everything the investigation did, for `--debug`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new() -> Self { Self { entries: Vec::new() } }

    pub fn record(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all entries with the given event name
    pub fn for_event(&self, event: &str) -> Vec<&TraceEntry> {
        self.entries.iter().filter(|e| e.event == event).collect()
    }

    /// Serializes the trace to a pretty-printed JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.entries)
            .unwrap_or_else(|_| "[]".to_string())
    }

    /// Renders a table of entries; `data` is cut to `width` characters.
    pub fn render(&self, width: usize) -> String {
        let mut out = format!("{:<6} {:<10} {:<22} {}\n", "step", "phase", "event", "data");
        out.push_str(&"─".repeat(80));
        out.push('\n');
        for e in &self.entries {
            let data: String = e.data.chars().take(width).collect();
            out.push_str(&format!("{:<6} {:<10} {:<22} {}\n", e.step, e.phase, e.event, data));
        }
        out
    }
}
