//! Prompt construction for tariff extraction

use crate::source::{render_blocks, SourceBlock};
use eltariff_domain::traits::{ChatMessage, ModelRequest};
use eltariff_domain::{SchemaDescriptor, TariffModel};

/// Name of the structured output the backend must produce
pub const OUTPUT_NAME: &str = "submit_tariffs";

/// Builds model requests for extraction and improve rounds
pub struct PromptBuilder<'a> {
    descriptor: &'a SchemaDescriptor,
    blocks: &'a [SourceBlock],
    prior: Option<&'a TariffModel>,
    instruction: Option<&'a str>,
    company_hint: Option<&'a str>,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder for one schema version
    pub fn new(descriptor: &'a SchemaDescriptor) -> Self {
        Self {
            descriptor,
            blocks: &[],
            prior: None,
            instruction: None,
            company_hint: None,
        }
    }

    /// Evidence to extract from
    pub fn with_blocks(mut self, blocks: &'a [SourceBlock]) -> Self {
        self.blocks = blocks;
        self
    }

    /// Model to improve, sent as high-priority evidence
    pub fn with_prior(mut self, prior: &'a TariffModel) -> Self {
        self.prior = Some(prior);
        self
    }

    /// Amendment instruction
    pub fn with_instruction(mut self, instruction: &'a str) -> Self {
        self.instruction = Some(instruction);
        self
    }

    /// Operator name supplied by the caller
    pub fn with_company_hint(mut self, company: &'a str) -> Self {
        self.company_hint = Some(company);
        self
    }

    /// System instructions: domain guidance plus the schema description
    pub fn system(&self) -> String {
        format!("{}\n\n{}", SYSTEM_INSTRUCTIONS, self.descriptor.describe())
    }

    /// The first user turn
    pub fn user_message(&self) -> String {
        let mut prompt = String::new();

        if let Some(prior) = self.prior {
            prompt.push_str("Current tariff document (highest-priority evidence; keep everything the instruction does not change):\n");
            prompt.push_str("---\n");
            match prior.to_json_pretty() {
                Ok(json) => prompt.push_str(&json),
                Err(_) => prompt.push_str("{}"),
            }
            prompt.push_str("\n---\n\n");
        }

        if let Some(instruction) = self.instruction {
            prompt.push_str("Instruction:\n");
            prompt.push_str(instruction.trim());
            prompt.push_str("\n\n");
        }

        if !self.blocks.is_empty() {
            if self.prior.is_some() {
                prompt.push_str("Additional evidence:\n\n");
            } else {
                prompt.push_str("Extract every tariff described in the sources below.\n\n");
            }
            prompt.push_str(&render_blocks(self.blocks));
            prompt.push_str("\n\n");
        }

        if let Some(company) = self.company_hint {
            prompt.push_str(&format!("Grid operator: {}\n\n", company.trim()));
        }

        prompt.push_str(OUTPUT_REMINDER);
        prompt
    }

    /// Build the complete request
    pub fn build(&self, max_tokens: u32) -> ModelRequest {
        ModelRequest {
            system: self.system(),
            messages: vec![ChatMessage::user(self.user_message())],
            schema_name: OUTPUT_NAME.to_string(),
            output_schema: self.descriptor.model_output_schema().clone(),
            max_tokens,
        }
    }
}

/// Follow-up turns after output that broke the contract
pub fn corrective_turns(rejected_output: &str, failure: &str) -> [ChatMessage; 2] {
    [
        ChatMessage::assistant(rejected_output),
        ChatMessage::user(format!(
            "That output could not be used: {}.\n\
             Reply again with only the JSON object: a top-level object with a non-empty \"tariffs\" array.",
            failure
        )),
    ]
}

const SYSTEM_INSTRUCTIONS: &str = r#"You convert descriptions of Swedish electricity grid tariffs (elnätstariffer) into the RISE grid tariff format.

Grid tariffs usually combine:
- fixedPrice: subscription fees per month or year, independent of use (fast avgift, abonnemangsavgift). No unit; set pricedPeriod (P1M, P1Y).
- energyPrice: fees per kWh (överföringsavgift, energiavgift), often split into high load (höglast, typically weekdays 06-22) and low load (låglast, nights, weekends and holidays).
- powerPrice: fees per kW (effektavgift) based on measured peaks, often the average of the highest peaks in a month.

Seasonal prices (winter November-March, summer April-October) are separate components with their own validPeriod.
Time-of-day windows go in recurringPeriods; restrict them to days with calendarPatternReferences using the patterns "weekdays", "weekends" and "holidays".

Rules:
- Give prices as numbers. State priceExVat, priceIncVat and vatRate when the source does; otherwise give the one amount it states.
- Convert öre to kronor yourself or state the currency as written; never guess amounts.
- Use ISO 8601 for dates (YYYY-MM-DD), times (HH:MM:SS) and durations (P1M, PT1H).
- Always include validPeriod; use the first day of the current year when the source gives no date.
- Put caveats, assumptions and anything you could not map into "warnings"."#;

const OUTPUT_REMINDER: &str =
    "Respond only with the JSON object described by the schema. No markdown, no explanations.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceNormalizer;
    use eltariff_domain::SourceInput;
    use eltariff_domain::traits::Role;

    fn blocks() -> Vec<SourceBlock> {
        SourceNormalizer::new().normalize(&[SourceInput::url(
            "Nätavgift 24 öre/kWh",
            "https://example.se/tariffer",
        )])
    }

    #[test]
    fn test_prompt_includes_labelled_sources() {
        let blocks = blocks();
        let prompt = PromptBuilder::new(SchemaDescriptor::current())
            .with_blocks(&blocks)
            .user_message();
        assert!(prompt.contains("=== SOURCE 1: URL (https://example.se/tariffer) ==="));
        assert!(prompt.contains("Nätavgift 24 öre/kWh"));
        assert!(prompt.ends_with(OUTPUT_REMINDER));
    }

    #[test]
    fn test_system_prompt_describes_schema() {
        let system = PromptBuilder::new(SchemaDescriptor::current()).system();
        assert!(system.contains("elnätstariffer"));
        assert!(system.contains("companyOrgNo"));
        assert!(system.contains("peakIdentificationSettings"));
    }

    #[test]
    fn test_improve_prompt_carries_prior_and_instruction() {
        let prior = TariffModel {
            schema_version: "0.1.0".to_string(),
            tariffs: Vec::new(),
            calendar_patterns: Vec::new(),
            warnings: vec!["osäker moms".to_string()],
            extensions: Default::default(),
        };
        let prompt = PromptBuilder::new(SchemaDescriptor::current())
            .with_prior(&prior)
            .with_instruction("  Höj fast avgift till 350 kr  ")
            .with_company_hint("Exempel Nät AB")
            .user_message();
        assert!(prompt.contains("osäker moms"));
        assert!(prompt.contains("Instruction:\nHöj fast avgift till 350 kr\n"));
        assert!(prompt.contains("Grid operator: Exempel Nät AB"));
        assert!(!prompt.contains("Additional evidence"));
    }

    #[test]
    fn test_build_declares_output_schema() {
        let request = PromptBuilder::new(SchemaDescriptor::current()).build(4096);
        assert_eq!(request.schema_name, OUTPUT_NAME);
        assert_eq!(request.max_tokens, 4096);
        assert_eq!(request.output_schema["required"], serde_json::json!(["tariffs"]));
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_corrective_turns() {
        let [assistant, user] = corrective_turns("oops", "output is not valid JSON");
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.content, "oops");
        assert!(user.content.contains("output is not valid JSON"));
    }
}
