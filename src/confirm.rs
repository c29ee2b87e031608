//! Confirmation Gate
//!
//! Every workspace mutation passes through an explicit, blocking confirmation
//! prompt. Edit and undo are recognized but unimplemented; they surface as a
//! distinct `Unsupported` decision so callers can tell "user declined" from
//! "user asked for a feature that does not exist yet". Either way nothing is
//! committed.

use crate::error::AgentError;
use owo_colors::OwoColorize;

/// Maximum preview lines shown before truncation.
const PREVIEW_MAX_LINES: usize = 20;

/// Outcome of a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Rejected,
    Unsupported(UnsupportedAction),
}

/// Recognized responses with no implementation behind them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedAction {
    Edit,
    Undo,
}

impl Decision {
    /// Whether the proposed mutation may be committed.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted)
    }
}

/// Source of user responses, seamed for testing.
pub trait ResponseSource {
    fn read_response(&mut self, prompt: &str) -> Result<String, AgentError>;
}

/// Interactive response source over the terminal.
pub struct TerminalResponses;

impl ResponseSource for TerminalResponses {
    fn read_response(&mut self, prompt: &str) -> Result<String, AgentError> {
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(|e| AgentError::Config(format!("Failed to get user input: {}", e)))
    }
}

/// Interactive gate requiring an explicit accept before any mutation.
pub struct ConfirmationGate<S: ResponseSource> {
    source: S,
}

impl ConfirmationGate<TerminalResponses> {
    pub fn new() -> Self {
        Self::with_source(TerminalResponses)
    }
}

impl Default for ConfirmationGate<TerminalResponses> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ResponseSource> ConfirmationGate<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    /// Present the action (and optional truncated preview), then block until
    /// the user gives a recognized response. Unrecognized input reprompts.
    pub fn confirm(
        &mut self,
        action: &str,
        preview: Option<&str>,
    ) -> Result<Decision, AgentError> {
        println!();
        println!("{} {}", "PROPOSED ACTION:".bold(), action);
        if let Some(preview) = preview {
            println!("{}", "PREVIEW:".bold());
            println!("{}", format_preview(preview, PREVIEW_MAX_LINES));
        }

        loop {
            let response = self
                .source
                .read_response("Accept (y) | Reject (n) | Edit (e) | Undo (u)")?;
            match parse_decision(&response) {
                Some(decision) => return Ok(decision),
                None => {
                    println!("Please respond with: y, n, e, or u");
                }
            }
        }
    }
}

/// Map a response to a decision; `None` means reprompt.
fn parse_decision(response: &str) -> Option<Decision> {
    match response.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(Decision::Accepted),
        "n" | "no" => Some(Decision::Rejected),
        "e" | "edit" => Some(Decision::Unsupported(UnsupportedAction::Edit)),
        "u" | "undo" => Some(Decision::Unsupported(UnsupportedAction::Undo)),
        _ => None,
    }
}

/// Truncate a preview to a fixed line count with a trailing count of what
/// was elided.
pub fn format_preview(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        return text.to_string();
    }
    let mut preview = lines[..max_lines].join("\n");
    preview.push_str(&format!("\n... ({} more lines)", lines.len() - max_lines));
    preview
}
