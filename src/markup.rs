/// Turns analysis payloads into renderable blocks: `#`-prefixed headings,
/// `**emphasis**` runs, labelled fields and formatted dumps.
use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::{AnalysisBody, AnalysisOutcome, AnalysisResult};

// Paragraphs may span several lines; the marker must sit on the first one
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(#{1,4})[ \t]+(.*)$").expect("heading pattern"));
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\*\*(.+?)\*\*").expect("emphasis pattern"));

#[derive(Debug, Clone, PartialEq)]
pub enum Span {
    Plain(String),
    Emphasis(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Field { label: &'static str, value: String },
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    /// Shown verbatim, whitespace preserved
    Preformatted(String),
    Error(String),
}

/// Split a line into plain and emphasized runs, in order
pub fn split_emphasis(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;

    for caps in EMPHASIS.captures_iter(line) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > cursor {
            spans.push(Span::Plain(line[cursor..whole.start()].to_string()));
        }
        spans.push(Span::Emphasis(inner.as_str().to_string()));
        cursor = whole.end();
    }

    if cursor < line.len() {
        spans.push(Span::Plain(line[cursor..].to_string()));
    }
    spans
}

/// One paragraph of the analysis, headings detected by their `#` prefix
pub fn parse_paragraph(paragraph: &str) -> Entry {
    let trimmed = paragraph.trim();

    match HEADING.captures(trimmed) {
        Some(caps) => {
            let level = caps.get(1).map_or(1, |m| m.as_str().len()) as u8;
            let text = caps.get(2).map_or("", |m| m.as_str());
            Entry::Heading {
                level,
                spans: split_emphasis(text),
            }
        }
        None => Entry::Paragraph(split_emphasis(trimmed)),
    }
}

/// Everything the result area shows for one outcome
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultDocument {
    pub entries: Vec<Entry>,
}

impl ResultDocument {
    pub fn from_outcome(outcome: &AnalysisOutcome) -> ResultDocument {
        match outcome {
            AnalysisOutcome::Success(result) => ResultDocument::from_result(result),
            AnalysisOutcome::Failed(e) => ResultDocument {
                entries: vec![Entry::Error(e.to_string())],
            },
        }
    }

    pub fn from_result(result: &AnalysisResult) -> ResultDocument {
        let mut entries = Vec::new();

        if let Some(url) = &result.url {
            entries.push(Entry::Field {
                label: "URL",
                value: url.clone(),
            });
        }
        if let Some(bias) = &result.overall_bias {
            entries.push(Entry::Field {
                label: "Overall Bias",
                value: bias.clone(),
            });
        }
        if let Some(bias) = &result.bias_analysis {
            entries.push(Entry::Field {
                label: "Bias",
                value: bias.clone(),
            });
        }

        match &result.analysis {
            Some(AnalysisBody::Paragraphs(paragraphs)) => {
                entries.extend(
                    paragraphs
                        .iter()
                        .filter(|p| !p.trim().is_empty())
                        .map(|p| parse_paragraph(p)),
                );
            }
            Some(AnalysisBody::Text(text)) => entries.push(Entry::Preformatted(text.clone())),
            Some(AnalysisBody::Opaque(value)) => entries.push(Entry::Preformatted(pretty(value))),
            None => {}
        }

        // Unknown response shape: show whatever came back
        if entries.is_empty() {
            entries.push(Entry::Preformatted(pretty(&result.raw)));
        }

        ResultDocument { entries }
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
