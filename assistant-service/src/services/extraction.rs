//! Label-anchored parsing and rendering of product analysis bullet lists.
//!
//! The model is asked to answer with lines such as `- Vikt: 12 kg`. Each
//! field is read from the first line starting with its label; the rest of the
//! reply is ignored.

use crate::config::AnalysisLayout;
use crate::models::ProductSpec;
use once_cell::sync::Lazy;
use regex::Regex;

const ABSENT_TEXT: &str = "—";
const ABSENT_MEASURE: &str = "Osäker";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Product,
    Model,
    Length,
    Width,
    Height,
    Weight,
    Uncertainty,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Product,
        Field::Model,
        Field::Length,
        Field::Width,
        Field::Height,
        Field::Weight,
        Field::Uncertainty,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Product => "Produkt/serie",
            Field::Model => "Serienummer/modell",
            Field::Length => "Längd",
            Field::Width => "Bredd",
            Field::Height => "Höjd",
            Field::Weight => "Vikt",
            Field::Uncertainty => "Osäkerhet/antaganden",
        }
    }

    fn slot(self, spec: &mut ProductSpec) -> &mut Option<String> {
        match self {
            Field::Product => &mut spec.product,
            Field::Model => &mut spec.model,
            Field::Length => &mut spec.length,
            Field::Width => &mut spec.width,
            Field::Height => &mut spec.height,
            Field::Weight => &mut spec.weight,
            Field::Uncertainty => &mut spec.uncertainty,
        }
    }
}

struct LabelPattern {
    field: Field,
    /// Selects the line: `- <label>:` at line start.
    line: Regex,
    /// Captures everything after `<label>:`.
    value: Regex,
}

static LABEL_PATTERNS: Lazy<Vec<LabelPattern>> = Lazy::new(|| {
    Field::ALL
        .iter()
        .map(|&field| {
            let label = regex::escape(field.label());
            LabelPattern {
                field,
                line: Regex::new(&format!(r"(?i)^-\s*{}:", label)).expect("static regex"),
                value: Regex::new(&format!(r"(?i){}\s*:\s*(.*)", label)).expect("static regex"),
            }
        })
        .collect()
});

/// Pull the labeled fields out of a model reply.
pub fn parse_spec(text: &str) -> ProductSpec {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut spec = ProductSpec::default();
    for pattern in LABEL_PATTERNS.iter() {
        let value = lines
            .iter()
            .find(|line| pattern.line.is_match(line))
            .and_then(|line| pattern.value.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|v| !v.is_empty());
        *pattern.field.slot(&mut spec) = value;
    }
    spec
}

/// Write the fixed labeled lines for `layout`: seven for detailed, five for
/// compact. Absent text fields show `—`, absent measures `Osäker`.
pub fn render_spec(spec: &ProductSpec, layout: AnalysisLayout) -> String {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| ABSENT_TEXT.to_string());
    let measure = |v: &Option<String>| v.clone().unwrap_or_else(|| ABSENT_MEASURE.to_string());

    let mut lines = vec![(Field::Product, text(&spec.product))];
    if layout == AnalysisLayout::Detailed {
        lines.push((Field::Model, text(&spec.model)));
    }
    lines.extend([
        (Field::Length, measure(&spec.length)),
        (Field::Width, measure(&spec.width)),
        (Field::Height, measure(&spec.height)),
        (Field::Weight, measure(&spec.weight)),
    ]);
    if layout == AnalysisLayout::Detailed {
        lines.push((Field::Uncertainty, text(&spec.uncertainty)));
    }

    lines
        .into_iter()
        .map(|(field, value)| format!("- {}: {}", field.label(), value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Success-shaped answer used when the model could not be reached. The note
/// lands in the uncertainty line, or after the product dash in the compact
/// layout, which has no uncertainty line.
pub fn placeholder(note: &str, layout: AnalysisLayout) -> String {
    let spec = match layout {
        AnalysisLayout::Detailed => ProductSpec {
            uncertainty: Some(note.to_string()),
            ..Default::default()
        },
        AnalysisLayout::Compact => ProductSpec {
            product: Some(format!("{} ({})", ABSENT_TEXT, note)),
            ..Default::default()
        },
    };
    render_spec(&spec, layout)
}
