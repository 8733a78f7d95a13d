//! Second-call gap filling for dimensions and weight.
//!
//! When the image answer names a product but leaves sizes or weight blank or
//! marked uncertain, the catalogue prompt is asked for the same figures as a
//! small JSON object and the values are spliced back into the parsed fields.

use crate::models::ProductSpec;
use crate::services::prompts;
use crate::services::providers::ChatRequest;
use serde_json::{Map, Value};

const ENRICHMENT_TEMPERATURE: f32 = 0.1;
const ENRICHMENT_MAX_TOKENS: u32 = 200;

/// Figures returned by the enrichment call. Values may arrive as strings or
/// numbers; blanks and zeros count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichedSpecs {
    pub length_cm: Option<String>,
    pub width_cm: Option<String>,
    pub height_cm: Option<String>,
    pub weight_kg: Option<String>,
    pub note: Option<String>,
}

impl EnrichedSpecs {
    /// Read the known keys from a parsed object. A repeated key keeps its
    /// last value.
    fn from_object(object: &Map<String, Value>) -> Self {
        let field = |key: &str| object.get(key).and_then(lenient_value);
        Self {
            length_cm: field("langd_cm"),
            width_cm: field("bredd_cm"),
            height_cm: field("hojd_cm"),
            weight_kg: field("vikt_kg"),
            note: field("notis"),
        }
    }
}

fn lenient_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => format_number(n),
        _ => None,
    }
}

/// Whole numbers render without a decimal part (`80.0` as `80`).
fn format_number(n: &serde_json::Number) -> Option<String> {
    if let Some(i) = n.as_i64() {
        return (i != 0).then(|| i.to_string());
    }
    if let Some(u) = n.as_u64() {
        return Some(u.to_string());
    }
    let f = n.as_f64().filter(|f| f.is_finite() && *f != 0.0)?;
    Some(if f.fract() == 0.0 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    })
}

/// Enrichment applies only to a named product with a gap in size or weight.
pub fn needs_enrichment(spec: &ProductSpec) -> bool {
    spec.product.is_some() && (spec.missing_size() || spec.missing_weight())
}

pub fn enrichment_request(spec: &ProductSpec) -> ChatRequest {
    ChatRequest::new(
        prompts::ENRICHMENT_PROMPT,
        prompts::enrichment_user_text(spec.product.as_deref(), spec.model.as_deref()),
    )
    .temperature(ENRICHMENT_TEMPERATURE)
    .max_tokens(ENRICHMENT_MAX_TOKENS)
}

/// Parse the JSON object embedded in a reply: everything from the first `{`
/// to the last `}`. Returns `None` when there is no parseable object.
pub fn parse_enrichment(raw: &str) -> Option<EnrichedSpecs> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<Value>(&raw[start..=end]).ok()? {
        Value::Object(object) => Some(EnrichedSpecs::from_object(&object)),
        _ => None,
    }
}

/// Splice enriched figures into `spec`. Dimensions are replaced only when the
/// size was missing and weight only when the weight was missing; a note is
/// always appended to the uncertainty field.
pub fn apply_enrichment(
    spec: &mut ProductSpec,
    enriched: &EnrichedSpecs,
    missing_size: bool,
    missing_weight: bool,
) {
    if missing_size {
        for (slot, value) in [
            (&mut spec.length, &enriched.length_cm),
            (&mut spec.width, &enriched.width_cm),
            (&mut spec.height, &enriched.height_cm),
        ] {
            if let Some(v) = value {
                *slot = Some(with_unit(v, "cm"));
            }
        }
    }

    if missing_weight {
        if let Some(v) = &enriched.weight_kg {
            spec.weight = Some(with_unit(v, "kg"));
        }
    }

    if let Some(note) = &enriched.note {
        spec.append_note(note);
    }
}

fn with_unit(value: &str, unit: &str) -> String {
    if value.to_lowercase().ends_with(unit) {
        value.to_string()
    } else {
        format!("{} {}", value, unit)
    }
}
