//! Derived generation operations with fixed prompt templates, all built on
//! `ReplicateClient::generate`.

use crate::error::AgentError;
use crate::provider::{PredictionTransport, ReplicateClient};

/// Token budget for code analysis and generation templates.
const CODE_MAX_TOKENS: u32 = 2048;

/// Token budget for plan generation.
const PLAN_MAX_TOKENS: u32 = 1024;

const TEMPLATE_TEMPERATURE: f32 = 0.7;

impl<T: PredictionTransport> ReplicateClient<T> {
    /// Analyze or modify code according to an instruction. Asks for the
    /// modified code or analysis result only, without explanation.
    pub async fn analyze_code(&self, code: &str, instruction: &str) -> Result<String, AgentError> {
        let prompt = format!(
            "You are an expert code analyzer and refactorer.\n\n\
             Instruction: {}\n\n\
             Code to analyze:\n```\n{}\n```\n\n\
             Provide only the modified code or analysis result, without additional explanation.",
            instruction, code
        );
        self.generate(&prompt, None, CODE_MAX_TOKENS, TEMPLATE_TEMPERATURE)
            .await
    }

    /// Generate code from a specification. Asks for code only, no markdown.
    pub async fn generate_code(&self, specification: &str) -> Result<String, AgentError> {
        let prompt = format!(
            "You are an expert developer. Generate clean, well-documented code based on the \
             following specification:\n\n{}\n\n\
             Provide only the code, without explanations or markdown formatting.",
            specification
        );
        self.generate(&prompt, None, CODE_MAX_TOKENS, TEMPLATE_TEMPERATURE)
            .await
    }

    /// Produce an ordered sequence of plan steps for an objective.
    ///
    /// The model is asked for a JSON array of strings; a response that does
    /// not parse falls back to non-blank line splitting, never to an error.
    pub async fn plan_tasks(&self, objective: &str) -> Result<Vec<String>, AgentError> {
        let prompt = format!(
            "You are a project planning expert. Create a detailed step-by-step plan for the \
             following objective:\n\n{}\n\n\
             Return ONLY a JSON array of steps, like this format:\n\
             [\"Step 1: Description\", \"Step 2: Description\", ...]\n\n\
             No other text, just the JSON array.",
            objective
        );
        let result = self
            .generate(&prompt, None, PLAN_MAX_TOKENS, TEMPLATE_TEMPERATURE)
            .await?;
        Ok(parse_plan_steps(&result))
    }
}

/// Parse a plan response: JSON array of strings, or fall back to splitting
/// the raw text by line, discarding blanks.
fn parse_plan_steps(response: &str) -> Vec<String> {
    if let Ok(steps) = serde_json::from_str::<Vec<String>>(response.trim()) {
        return steps;
    }
    response
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
