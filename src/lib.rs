//! Blink: Conversational Code-Generation CLI
//!
//! A workspace-aware agent that composes model prompts from file contents and
//! conversation history, submits them to a remote prediction API, and applies
//! accepted results to the workspace behind an explicit confirmation gate.

pub mod agent;
pub mod compose;
pub mod config;
pub mod confirm;
pub mod credential;
pub mod error;
pub mod logging;
pub mod provider;
pub mod session;
pub mod tooling;
pub mod workspace;
