//! Core Extractor implementation

use crate::config::{ExtractorConfig, MergeStrategy};
use crate::error::ExtractorError;
use crate::merge::{Alternative, MergeResolver};
use crate::parser::parse_model_output;
use crate::progress::{NoopProgress, ProgressEvent, ProgressSink};
use crate::prompt::{corrective_turns, PromptBuilder};
use crate::source::{check_relevance, SourceBlock, SourceNormalizer};
use crate::types::{Extraction, ExtractionMetadata, ExtractionRequest, ExtractionResult};
use eltariff_domain::traits::{BackendError, ModelBackend, ModelRequest};
use eltariff_domain::{SchemaDescriptor, SourceInput, SourceKind, TariffModel};
use eltariff_gatekeeper::{Gatekeeper, Validated};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// The Extractor turns tariff evidence into a validated tariff model
pub struct Extractor {
    backend: Arc<dyn ModelBackend>,
    gatekeeper: Gatekeeper,
    config: ExtractorConfig,
    progress: Arc<dyn ProgressSink>,
}

// model, notes, alternatives, contributing kinds
type Outcome = (TariffModel, Vec<String>, Vec<Alternative>, Vec<SourceKind>);

#[derive(Debug, Default)]
struct Counters {
    model_attempts: u32,
    backend_calls: u32,
}

impl Extractor {
    /// Create a new Extractor
    pub fn new(backend: impl ModelBackend + 'static, gatekeeper: Gatekeeper, config: ExtractorConfig) -> Self {
        Self::from_arc(Arc::new(backend), gatekeeper, config)
    }

    /// Create a new Extractor around a shared backend
    pub fn from_arc(backend: Arc<dyn ModelBackend>, gatekeeper: Gatekeeper, config: ExtractorConfig) -> Self {
        Self {
            backend,
            gatekeeper,
            config,
            progress: Arc::new(NoopProgress),
        }
    }

    /// Report progress to `sink`
    pub fn with_progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Arc::new(sink);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract a validated tariff model
    ///
    /// A request carrying a prior model runs in improve mode; see
    /// [`Extractor::improve`].
    pub async fn extract(&self, request: ExtractionRequest) -> ExtractionResult {
        let start = Instant::now();
        self.config.validate().map_err(ExtractorError::Config)?;

        info!(
            backend = self.backend.name(),
            sources = request.sources.len(),
            improve = request.is_improve(),
            "Starting extraction"
        );

        self.progress.emit(ProgressEvent::Normalizing);
        let blocks = SourceNormalizer::new().normalize(&request.sources);
        let mut counters = Counters::default();

        let (model, notes, alternatives, sources) = match &request.prior {
            Some(prior) => {
                let validated = self
                    .run_improve(
                        prior,
                        request.instruction.as_deref(),
                        &blocks,
                        request.company_hint.as_deref(),
                        &mut counters,
                    )
                    .await?;
                let mut sources: Vec<SourceKind> = blocks.iter().map(|b| b.kind).collect();
                self.sort_kinds(&mut sources);
                (validated.model, validated.notes, Vec::new(), sources)
            }
            None => {
                self.run_extract(blocks, request.company_hint.as_deref(), &mut counters)
                    .await?
            }
        };

        self.progress.emit(ProgressEvent::Done);
        let metadata = ExtractionMetadata {
            backend: self.backend.name().to_string(),
            model_attempts: counters.model_attempts,
            backend_calls: counters.backend_calls,
            sources,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            tariffs = model.tariffs.len(),
            alternatives = alternatives.len(),
            model_attempts = metadata.model_attempts,
            processing_time_ms = metadata.processing_time_ms,
            "Extraction complete"
        );

        Ok(Extraction {
            model,
            notes,
            alternatives,
            metadata,
        })
    }

    /// Re-extract `prior` under an amendment instruction
    ///
    /// The prior model goes to the backend as high-priority evidence next to
    /// any new evidence, and the answer is validated like a fresh extraction.
    pub async fn improve(
        &self,
        prior: TariffModel,
        instruction: impl Into<String>,
        evidence: Vec<SourceInput>,
    ) -> ExtractionResult {
        let mut request = ExtractionRequest::improve(prior, instruction);
        request.sources = evidence;
        self.extract(request).await
    }

    async fn run_extract(
        &self,
        blocks: Vec<SourceBlock>,
        company_hint: Option<&str>,
        counters: &mut Counters,
    ) -> Result<Outcome, ExtractorError> {
        if blocks.is_empty() {
            return Err(ExtractorError::InvalidRequest("no non-empty sources supplied".to_string()));
        }

        let (structured, evidence): (Vec<SourceBlock>, Vec<SourceBlock>) = blocks
            .into_iter()
            .partition(|block| block.kind == SourceKind::Structured);

        if self.config.require_tariff_keywords && !evidence.is_empty() {
            let text: Vec<&str> = evidence.iter().map(|b| b.text.as_str()).collect();
            check_relevance(&text.join("\n"))?;
        }

        let mut candidates: Vec<(SourceKind, TariffModel)> = Vec::new();
        let mut notes = Vec::new();

        for block in &structured {
            self.progress.emit(ProgressEvent::Validating);
            let validated = self
                .gatekeeper
                .validate_json(&block.text)
                .map_err(|report| ExtractorError::SchemaValidationFailed {
                    report,
                    raw_output: Some(block.text.clone()),
                })?;
            notes.extend(validated.notes);
            candidates.push((SourceKind::Structured, validated.model));
        }

        let descriptor = SchemaDescriptor::current();
        for (kind, group) in self.group_blocks(evidence) {
            debug!(%kind, blocks = group.len(), "Extracting source group");
            let mut builder = PromptBuilder::new(descriptor).with_blocks(&group);
            if let Some(company) = company_hint {
                builder = builder.with_company_hint(company);
            }
            let validated = self.extract_group(builder.build(self.config.max_tokens), counters).await?;
            notes.extend(validated.notes);
            candidates.push((kind, validated.model));
        }

        let mut sources: Vec<SourceKind> = candidates.iter().map(|(kind, _)| *kind).collect();
        self.sort_kinds(&mut sources);

        if candidates.len() == 1 {
            if let Some((_, model)) = candidates.pop() {
                return Ok((model, notes, Vec::new(), sources));
            }
        }

        self.progress.emit(ProgressEvent::Merging);
        let merged = MergeResolver::new(self.config.clone(), self.gatekeeper.clone()).merge(candidates)?;
        notes.extend(merged.notes);
        Ok((merged.model, notes, merged.alternatives, sources))
    }

    async fn run_improve(
        &self,
        prior: &TariffModel,
        instruction: Option<&str>,
        blocks: &[SourceBlock],
        company_hint: Option<&str>,
        counters: &mut Counters,
    ) -> Result<Validated, ExtractorError> {
        let instruction = instruction.map(str::trim).unwrap_or_default();
        if instruction.is_empty() {
            return Err(ExtractorError::InvalidRequest(
                "improve needs a non-empty instruction".to_string(),
            ));
        }
        let descriptor = SchemaDescriptor::for_version(&prior.schema_version).ok_or_else(|| {
            ExtractorError::InvalidRequest(format!(
                "prior model uses unsupported schema version {}",
                prior.schema_version
            ))
        })?;

        let mut builder = PromptBuilder::new(descriptor)
            .with_prior(prior)
            .with_instruction(instruction)
            .with_blocks(blocks);
        if let Some(company) = company_hint {
            builder = builder.with_company_hint(company);
        }
        self.extract_group(builder.build(self.config.max_tokens), counters).await
    }

    // One group per source kind in priority order, or a single group
    fn group_blocks(&self, evidence: Vec<SourceBlock>) -> Vec<(SourceKind, Vec<SourceBlock>)> {
        let mut kinds: Vec<SourceKind> = evidence.iter().map(|b| b.kind).collect();
        self.sort_kinds(&mut kinds);

        match self.config.merge_strategy {
            MergeStrategy::Combined => match kinds.first() {
                Some(kind) => vec![(*kind, evidence)],
                None => Vec::new(),
            },
            MergeStrategy::PerSource => kinds
                .into_iter()
                .map(|kind| {
                    let group = evidence.iter().filter(|b| b.kind == kind).cloned().collect();
                    (kind, group)
                })
                .collect(),
        }
    }

    fn sort_kinds(&self, kinds: &mut Vec<SourceKind>) {
        kinds.sort_by_key(|kind| self.config.priority_of(*kind));
        kinds.dedup();
    }

    /// Attempt loop for one request: parse failures get a corrective turn
    async fn extract_group(&self, mut request: ModelRequest, counters: &mut Counters) -> Result<Validated, ExtractorError> {
        let max_attempts = self.config.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            counters.model_attempts += 1;
            self.progress.emit(ProgressEvent::SendingToModel { attempt });
            let raw = self.call_backend(&request, counters).await?;
            debug!(attempt, chars = raw.len(), "Model output received");

            self.progress.emit(ProgressEvent::Parsing);
            match parse_model_output(&raw) {
                Ok(document) => {
                    self.progress.emit(ProgressEvent::Validating);
                    return self.gatekeeper.validate(&document).map_err(|report| {
                        warn!(violations = report.len(), "Model output failed validation");
                        ExtractorError::SchemaValidationFailed {
                            report,
                            raw_output: Some(raw),
                        }
                    });
                }
                Err(detail) if attempt < max_attempts => {
                    warn!(attempt, %detail, "Malformed model output, asking for a correction");
                    self.progress.emit(ProgressEvent::Retrying { reason: detail.clone() });
                    request.messages.extend(corrective_turns(&raw, &detail));
                }
                Err(detail) => {
                    return Err(ExtractorError::ModelOutputMalformed {
                        attempts: attempt,
                        detail,
                        raw_output: raw,
                    });
                }
            }
        }
    }

    /// One model attempt, with transport retries and backoff
    async fn call_backend(&self, request: &ModelRequest, counters: &mut Counters) -> Result<String, ExtractorError> {
        let mut retries = 0;

        loop {
            counters.backend_calls += 1;
            let outcome = match timeout(self.config.call_timeout(), self.backend.complete(request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(BackendError::Timeout),
            };
            let error = match outcome {
                Ok(raw) => return Ok(raw),
                Err(error) => error,
            };

            if !error.is_retryable() {
                warn!(backend = self.backend.name(), %error, "Backend rejected request");
                return Err(ExtractorError::BackendUnavailable {
                    attempts: retries + 1,
                    retryable: false,
                    source: error,
                });
            }
            if retries >= self.config.transport_retries {
                warn!(backend = self.backend.name(), %error, calls = retries + 1, "Backend unavailable");
                return Err(ExtractorError::BackendUnavailable {
                    attempts: retries + 1,
                    retryable: true,
                    source: error,
                });
            }

            let delay = error
                .retry_after()
                .unwrap_or_else(|| self.config.backoff_delay(retries))
                .min(self.config.backoff_max());
            warn!(
                backend = self.backend.name(),
                %error,
                retry = retries + 1,
                delay_ms = delay.as_millis() as u64,
                "Backend call failed, retrying"
            );
            self.progress.emit(ProgressEvent::Retrying {
                reason: error.to_string(),
            });
            tokio::time::sleep(delay).await;
            retries += 1;
        }
    }
}
