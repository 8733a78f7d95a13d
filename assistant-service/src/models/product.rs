use once_cell::sync::Lazy;
use regex::Regex;

/// Markers the model uses when it could not determine a value.
static UNCERTAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)osäker|okänd|n/a|ingen").expect("static regex"));

/// Fields scraped from a product analysis reply. Every field is optional;
/// blank values are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSpec {
    pub product: Option<String>,
    pub model: Option<String>,
    pub length: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub weight: Option<String>,
    pub uncertainty: Option<String>,
}

impl ProductSpec {
    /// Any of length, width or height is absent or flagged as uncertain.
    pub fn missing_size(&self) -> bool {
        [&self.length, &self.width, &self.height]
            .into_iter()
            .any(|v| is_unknown(v.as_deref()))
    }

    pub fn missing_weight(&self) -> bool {
        is_unknown(self.weight.as_deref())
    }

    /// Append a note to the uncertainty field, space separated.
    pub fn append_note(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        self.uncertainty = Some(match self.uncertainty.take() {
            Some(existing) => format!("{} {}", existing, note),
            None => note.to_string(),
        });
    }
}

/// `true` for a missing value or one carrying an uncertainty marker.
pub fn is_unknown(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => v.trim().is_empty() || UNCERTAIN_RE.is_match(v),
    }
}
