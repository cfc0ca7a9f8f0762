//! Eltariff Extractor
//!
//! Turns tariff evidence (web pages, PDF text, notes, existing JSON) into a
//! validated tariff model with a structured-output model backend.
//!
//! # Architecture
//!
//! ```text
//! Sources → SourceNormalizer → PromptBuilder → Backend → Parser → Gatekeeper
//!                                                                    ↓
//!                                              MergeResolver (several sources)
//! ```
//!
//! # Key Features
//!
//! - **Labelled evidence**: every source is a numbered, labelled block
//! - **Bounded retries**: corrective turns for malformed output, backoff for transport failures
//! - **Per-source merge**: one candidate per source kind, combined by priority
//! - **Improve mode**: re-extraction of a prior model under an instruction
//! - **Progress**: stage events through a [`ProgressSink`]
//!
//! # Example Usage
//!
//! ```no_run
//! use eltariff_extractor::{Extractor, ExtractorConfig, ExtractionRequest};
//! use eltariff_gatekeeper::Gatekeeper;
//! use eltariff_llm::MockBackend;
//! use eltariff_domain::SourceInput;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MockBackend::new(r#"{"tariffs": [{"name": "Enkeltariff"}]}"#);
//! let extractor = Extractor::new(backend, Gatekeeper::default_config(), ExtractorConfig::default());
//!
//! let request = ExtractionRequest::new(vec![SourceInput::text(
//!     "Elnätstariff 2025: fast avgift 3 600 kr/år, överföring 24 öre/kWh",
//! )]);
//!
//! let extraction = extractor.extract(request).await?;
//! println!("Tariffs: {}", extraction.model.tariffs.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod merge;
mod parser;
mod progress;
mod prompt;
mod source;
mod types;

#[cfg(test)]
mod tests;

pub use config::{ExtractorConfig, MergeStrategy, TieBreak};
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use merge::{Alternative, MergeConflict, MergeResolver, Merged};
pub use parser::parse_model_output;
pub use progress::{ChannelProgress, NoopProgress, ProgressEvent, ProgressSink};
pub use prompt::{corrective_turns, PromptBuilder, OUTPUT_NAME};
pub use source::{check_relevance, keyword_hits, normalize_whitespace, render_blocks, SourceBlock, SourceNormalizer};
pub use types::{Extraction, ExtractionMetadata, ExtractionRequest, ExtractionResult};
