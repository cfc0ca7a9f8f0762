//! Source normalization: raw inputs into labelled text blocks

use crate::error::ExtractorError;
use eltariff_domain::{SourceInput, SourceKind};
use tracing::{debug, warn};

/// Words suggesting grid tariff content
const KEYWORDS: &[&str] = &[
    "elnät",
    "elnäts",
    "elnätsbolag",
    "elnätstariff",
    "nätavgift",
    "överföringsavgift",
    "tariff",
    "effekt",
    "effektavgift",
    "abonnemang",
    "säkring",
    "förbrukning",
    "energipris",
    "energiavgift",
    "kwh",
    "kw",
    "kvar",
    "öre",
    "kr/kwh",
    "kr/kw",
    "rise",
];

/// At least one of these must appear
const STRONG_KEYWORDS: &[&str] = &[
    "elnät",
    "elnätstariff",
    "nätavgift",
    "överföringsavgift",
    "effektavgift",
    "kwh",
    "kw",
    "kr/kwh",
    "kr/kw",
    "tariff",
];

/// One labelled piece of evidence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlock {
    /// Position among the kept blocks, from 1
    pub number: usize,

    /// Kind of source
    pub kind: SourceKind,

    /// Origin hint, for provenance only
    pub origin: Option<String>,

    /// Normalized content
    pub text: String,
}

impl SourceBlock {
    /// Provenance label, e.g. `=== SOURCE 2: URL (https://example.se/tariffer) ===`
    pub fn label(&self) -> String {
        match &self.origin {
            Some(origin) => format!("=== SOURCE {}: {} ({}) ===", self.number, self.kind.label(), origin),
            None => format!("=== SOURCE {}: {} ===", self.number, self.kind.label()),
        }
    }

    /// Label followed by the text
    pub fn render(&self) -> String {
        format!("{}\n{}", self.label(), self.text)
    }
}

/// Render blocks for a prompt, separated by blank lines
pub fn render_blocks(blocks: &[SourceBlock]) -> String {
    blocks
        .iter()
        .map(SourceBlock::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Converts raw inputs into labelled blocks
#[derive(Debug, Clone, Default)]
pub struct SourceNormalizer;

impl SourceNormalizer {
    /// Create a normalizer
    pub fn new() -> Self {
        Self
    }

    /// Normalize inputs, dropping empty ones
    ///
    /// Structured inputs keep their content verbatim apart from trimming.
    pub fn normalize(&self, inputs: &[SourceInput]) -> Vec<SourceBlock> {
        let mut blocks = Vec::with_capacity(inputs.len());
        for (i, input) in inputs.iter().enumerate() {
            if input.is_empty() {
                warn!(index = i, kind = %input.kind, "Dropping empty source");
                continue;
            }
            let text = match input.kind {
                SourceKind::Structured => input.content.trim().to_string(),
                _ => normalize_whitespace(&input.content),
            };
            blocks.push(SourceBlock {
                number: blocks.len() + 1,
                kind: input.kind,
                origin: input.origin.clone().filter(|o| !o.trim().is_empty()),
                text,
            });
        }
        debug!(kept = blocks.len(), supplied = inputs.len(), "Normalized sources");
        blocks
    }
}

/// CRLF to LF, trailing spaces removed, at most two blank lines in a row
pub fn normalize_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0;
    for line in unified.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 2 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

/// Keywords found in text, lowercased
pub fn keyword_hits(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| lowered.contains(keyword))
        .collect()
}

/// Reject text that does not look like a grid tariff
pub fn check_relevance(text: &str) -> Result<(), ExtractorError> {
    let hits = keyword_hits(text);
    let strong = hits.iter().any(|hit| STRONG_KEYWORDS.contains(hit));
    if strong && hits.len() >= 2 {
        return Ok(());
    }
    Err(ExtractorError::InvalidRequest(
        "content does not look like an electricity grid tariff (expected terms such as elnät, kWh, effektavgift)"
            .to_string(),
    ))
}
