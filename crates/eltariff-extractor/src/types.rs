//! Request and response types for extraction

use crate::error::ExtractorError;
use crate::merge::Alternative;
use eltariff_domain::{SourceInput, SourceKind, TariffModel};

/// Request to extract a tariff model from sources
#[derive(Debug, Clone, Default)]
pub struct ExtractionRequest {
    /// Evidence, in the order supplied
    pub sources: Vec<SourceInput>,

    /// Model to improve (improve mode)
    pub prior: Option<TariffModel>,

    /// Amendment instruction (improve mode)
    pub instruction: Option<String>,

    /// Operator name supplied by the caller
    pub company_hint: Option<String>,
}

impl ExtractionRequest {
    /// Extract from sources
    pub fn new(sources: Vec<SourceInput>) -> Self {
        Self {
            sources,
            ..Self::default()
        }
    }

    /// Re-extract a prior model under an instruction
    pub fn improve(prior: TariffModel, instruction: impl Into<String>) -> Self {
        Self {
            prior: Some(prior),
            instruction: Some(instruction.into()),
            ..Self::default()
        }
    }

    /// Add one source
    pub fn with_source(mut self, source: SourceInput) -> Self {
        self.sources.push(source);
        self
    }

    /// Name the operator
    pub fn with_company_hint(mut self, company: impl Into<String>) -> Self {
        self.company_hint = Some(company.into());
        self
    }

    /// Whether this is an improve request
    pub fn is_improve(&self) -> bool {
        self.prior.is_some()
    }
}

/// A successful extraction
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The validated model
    pub model: TariffModel,

    /// Normalization notes from the final validation
    pub notes: Vec<String>,

    /// Values that lost a merge
    pub alternatives: Vec<Alternative>,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

/// Outcome of one extraction: a validated model or a typed failure
pub type ExtractionResult = Result<Extraction, ExtractorError>;

/// Metadata about an extraction operation
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMetadata {
    /// Backend that produced the output
    pub backend: String,

    /// Model attempts across all groups (corrective retries included)
    pub model_attempts: u32,

    /// Backend calls (transport retries included)
    pub backend_calls: u32,

    /// Source kinds that contributed a candidate, in priority order
    pub sources: Vec<SourceKind>,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
