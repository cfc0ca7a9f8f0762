//! Source inputs - the evidence a tariff model is extracted from

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Already-structured tariff JSON
    Structured,
    /// Text fetched from a web page
    Url,
    /// Text extracted from a PDF
    Pdf,
    /// Plain text pasted by a user
    Text,
}

impl SourceKind {
    /// All kinds, in default priority order
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Structured,
        SourceKind::Url,
        SourceKind::Pdf,
        SourceKind::Text,
    ];

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Structured => "structured",
            SourceKind::Url => "url",
            SourceKind::Pdf => "pdf",
            SourceKind::Text => "text",
        }
    }

    /// Label used in source block headers
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Structured => "STRUCTURED",
            SourceKind::Url => "URL",
            SourceKind::Pdf => "PDF",
            SourceKind::Text => "TEXT",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "structured" | "json" => Some(SourceKind::Structured),
            "url" | "web" => Some(SourceKind::Url),
            "pdf" => Some(SourceKind::Pdf),
            "text" => Some(SourceKind::Text),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInput {
    /// Kind of document
    pub kind: SourceKind,

    /// Raw content (text, or JSON for structured sources)
    pub content: String,

    /// Where the content came from: filename, address, or label
    pub origin: Option<String>,
}

impl SourceInput {
    /// Create a source of any kind
    pub fn new(kind: SourceKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            origin: None,
        }
    }

    /// Plain text source
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(SourceKind::Text, content)
    }

    /// Text extracted from a PDF
    pub fn pdf(content: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::new(SourceKind::Pdf, content).with_origin(filename)
    }

    /// Text fetched from a web page
    pub fn url(content: impl Into<String>, address: impl Into<String>) -> Self {
        Self::new(SourceKind::Url, content).with_origin(address)
    }

    /// Already-structured tariff JSON
    pub fn structured(json: impl Into<String>) -> Self {
        Self::new(SourceKind::Structured, json)
    }

    /// Attach an origin
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Whether the content is blank
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind_aliases() {
        assert_eq!(SourceKind::parse("PDF"), Some(SourceKind::Pdf));
        assert_eq!(SourceKind::parse("json"), Some(SourceKind::Structured));
        assert_eq!(SourceKind::parse("fax"), None);
    }

    #[test]
    fn test_constructors_set_origin() {
        let source = SourceInput::pdf("Nätavgift 2025", "prislista.pdf");
        assert_eq!(source.kind, SourceKind::Pdf);
        assert_eq!(source.origin.as_deref(), Some("prislista.pdf"));
        assert!(SourceInput::text("   \n").is_empty());
    }
}
