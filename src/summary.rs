/// Character cap applied to every adapter result.
pub const DEFAULT_MAX_CHARS: usize = 10_000;

pub const TRUNCATION_NOTICE: &str =
    "\n This query returned a huge amount of data and had to be truncated, so it's probably incomplete.";

/// Human-readable adapter output handed back to the LLM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    text:      String,
    truncated: bool,
}

impl Summary {
    /// Keeps at most `max_chars` characters of `text`, appending
    /// [`TRUNCATION_NOTICE`] when anything was cut.
    pub fn capped(text: impl Into<String>, max_chars: usize) -> Self {
        let text = text.into();
        match text.char_indices().nth(max_chars) {
            None => Self { text, truncated: false },
            Some((cut, _)) => {
                let mut kept = text[..cut].to_string();
                kept.push_str(TRUNCATION_NOTICE);
                Self { text: kept, truncated: true }
            }
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
