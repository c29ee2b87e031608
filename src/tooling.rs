//! Tooling & Integration Layer
//!
//! Command-line entry flags and the interactive REPL that drives the agent.

pub mod cli;
pub mod repl;
