//! Conversation Log
//!
//! Append-only record of the interactive session plus a flat context map of
//! recently referenced facts (last file read, etc.). The full session
//! snapshot is rewritten on every mutation, so a crash mid-write loses at
//! most the last entry, never the structure.

use crate::error::AgentError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Maximum characters of a single entry included in model-facing context.
const ENTRY_PREVIEW_CHARS: usize = 200;

/// Directory under the workspace root holding session state.
const HISTORY_DIR: &str = ".blink_history";

/// Speaker of a conversation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// One immutable record in the conversation. Ordering is insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

/// Counts reported by `ConversationLog::summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total: usize,
    pub user_messages: usize,
    pub commands: BTreeMap<String, usize>,
    pub context_entries: usize,
}

/// On-disk shape of the current session snapshot.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionSnapshot {
    #[serde(default)]
    history: Vec<ConversationEntry>,
    #[serde(default)]
    context: BTreeMap<String, String>,
}

/// One archived session inside the cumulative history file.
#[derive(Debug, Serialize, Deserialize)]
struct ArchivedSession {
    session_date: DateTime<Utc>,
    conversation: Vec<ConversationEntry>,
    context: BTreeMap<String, String>,
}

/// Session-scoped conversation state, persisted on every mutation.
pub struct ConversationLog {
    session_file: PathBuf,
    archive_file: PathBuf,
    entries: Vec<ConversationEntry>,
    context: BTreeMap<String, String>,
}

impl ConversationLog {
    /// Open (or initialize) the session under the given workspace root.
    ///
    /// A corrupted or missing snapshot starts an empty session with a
    /// warning, never a fatal error.
    pub fn open(workspace_root: &Path) -> Result<Self, AgentError> {
        let history_dir = workspace_root.join(HISTORY_DIR);
        std::fs::create_dir_all(&history_dir).map_err(|e| AgentError::io(&history_dir, e))?;

        let session_file = history_dir.join("current_session.json");
        let archive_file = history_dir.join("all_history.json");

        let snapshot = match std::fs::read_to_string(&session_file) {
            Ok(content) if !content.trim().is_empty() => {
                match serde_json::from_str::<SessionSnapshot>(&content) {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        tracing::warn!(
                            "Could not parse session snapshot {}: {}, starting empty",
                            session_file.display(),
                            e
                        );
                        SessionSnapshot::default()
                    }
                }
            }
            Ok(_) => SessionSnapshot::default(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => SessionSnapshot::default(),
            Err(e) => {
                tracing::warn!(
                    "Could not load session snapshot {}: {}, starting empty",
                    session_file.display(),
                    e
                );
                SessionSnapshot::default()
            }
        };

        Ok(Self {
            session_file,
            archive_file,
            entries: snapshot.history,
            context: snapshot.context,
        })
    }

    /// Append an entry and persist the snapshot.
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        command: Option<&str>,
        metadata: BTreeMap<String, String>,
    ) -> Result<(), AgentError> {
        self.entries.push(ConversationEntry {
            timestamp: Utc::now(),
            role,
            content: content.into(),
            command: command.map(|c| c.to_string()),
            metadata,
        });
        self.persist()
    }

    /// Set a context key and persist the snapshot.
    pub fn set_context(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), AgentError> {
        self.context.insert(key.into(), value.into());
        self.persist()
    }

    /// Get a context value, if set.
    pub fn get_context(&self, key: &str) -> Option<&str> {
        self.context.get(key).map(String::as_str)
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    /// Format the last `limit` entries as model-facing context, truncating
    /// any single entry's content to a fixed preview length.
    pub fn recent_context(&self, limit: usize) -> String {
        let start = self.entries.len().saturating_sub(limit);
        let mut out = String::from("Previous conversation:\n");
        for entry in &self.entries[start..] {
            let preview: String = entry.content.chars().take(ENTRY_PREVIEW_CHARS).collect();
            let ellipsis = if entry.content.chars().count() > ENTRY_PREVIEW_CHARS {
                "..."
            } else {
                ""
            };
            out.push_str(&format!(
                "\n{}: {}{}\n",
                entry.role.label(),
                preview,
                ellipsis
            ));
        }
        out
    }

    /// Counts over the session: entries, user entries, per-command usage,
    /// context map size.
    pub fn summary(&self) -> SessionSummary {
        let mut commands: BTreeMap<String, usize> = BTreeMap::new();
        let mut user_messages = 0;
        for entry in &self.entries {
            if entry.role == Role::User {
                user_messages += 1;
                let tag = entry.command.clone().unwrap_or_else(|| "unknown".to_string());
                *commands.entry(tag).or_insert(0) += 1;
            }
        }
        SessionSummary {
            total: self.entries.len(),
            user_messages,
            commands,
            context_entries: self.context.len(),
        }
    }

    /// Append the current session as one record into the cumulative history
    /// file. Failures on that file are logged and tolerated, never raised.
    pub fn archive(&self) {
        let mut all: Vec<ArchivedSession> = match std::fs::read_to_string(&self.archive_file) {
            Ok(content) if !content.trim().is_empty() => {
                match serde_json::from_str(&content) {
                    Ok(sessions) => sessions,
                    Err(e) => {
                        tracing::warn!(
                            "Could not parse history file {}: {}, starting a new one",
                            self.archive_file.display(),
                            e
                        );
                        Vec::new()
                    }
                }
            }
            Ok(_) => Vec::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    "Could not read history file {}: {}",
                    self.archive_file.display(),
                    e
                );
                return;
            }
        };

        all.push(ArchivedSession {
            session_date: Utc::now(),
            conversation: self.entries.clone(),
            context: self.context.clone(),
        });

        let serialized = match serde_json::to_string_pretty(&all) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Could not serialize session history: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.archive_file, serialized) {
            tracing::warn!(
                "Could not save session to {}: {}",
                self.archive_file.display(),
                e
            );
        }
    }

    /// Discard entries and context, persisting the empty snapshot.
    pub fn clear(&mut self) -> Result<(), AgentError> {
        self.entries.clear();
        self.context.clear();
        self.persist()
    }

    /// Serialize the full entry sequence as a markdown document.
    pub fn export(&self, path: &Path) -> Result<PathBuf, AgentError> {
        let mut doc = String::from("# Agent Conversation History\n\n");
        doc.push_str(&format!("Exported: {}\n\n", Utc::now().to_rfc3339()));
        for entry in &self.entries {
            doc.push_str(&format!(
                "## {} ({})\n",
                entry.role.label(),
                entry.timestamp.to_rfc3339()
            ));
            if let Some(command) = &entry.command {
                doc.push_str(&format!("*Command: {}*\n\n", command));
            }
            doc.push_str(&entry.content);
            doc.push_str("\n\n---\n\n");
        }
        std::fs::write(path, doc).map_err(|e| AgentError::io(path, e))?;
        Ok(path.to_path_buf())
    }

    fn persist(&self) -> Result<(), AgentError> {
        let snapshot = SessionSnapshot {
            history: self.entries.clone(),
            context: self.context.clone(),
        };
        let serialized = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| AgentError::Session(format!("Failed to serialize session: {}", e)))?;
        std::fs::write(&self.session_file, serialized)
            .map_err(|e| AgentError::io(&self.session_file, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_log() -> (tempfile::TempDir, ConversationLog) {
        let temp = tempfile::tempdir().unwrap();
        let log = ConversationLog::open(temp.path()).unwrap();
        (temp, log)
    }

    #[test]
    fn summary_counts_appends() {
        let (_temp, mut log) = open_log();
        for i in 0..4 {
            log.append(Role::User, format!("message {}", i), Some("read"), BTreeMap::new())
                .unwrap();
        }
        log.append(Role::Assistant, "done", Some("read"), BTreeMap::new())
            .unwrap();

        let summary = log.summary();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.user_messages, 4);
        assert_eq!(summary.commands.get("read"), Some(&4));
    }

    #[test]
    fn snapshot_survives_reopen() {
        let temp = tempfile::tempdir().unwrap();
        {
            let mut log = ConversationLog::open(temp.path()).unwrap();
            log.append(Role::User, "hello", Some("generate"), BTreeMap::new())
                .unwrap();
            log.set_context("last_read_file", "a.txt").unwrap();
        }
        let log = ConversationLog::open(temp.path()).unwrap();
        assert_eq!(log.entries().len(), 1);
        assert_eq!(log.get_context("last_read_file"), Some("a.txt"));
    }

    #[test]
    fn corrupted_snapshot_starts_empty() {
        let temp = tempfile::tempdir().unwrap();
        let history_dir = temp.path().join(HISTORY_DIR);
        std::fs::create_dir_all(&history_dir).unwrap();
        std::fs::write(history_dir.join("current_session.json"), "{not json").unwrap();

        let log = ConversationLog::open(temp.path()).unwrap();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn context_get_set_round_trip() {
        let (_temp, mut log) = open_log();
        log.set_context("last_created_file", "new.rs").unwrap();
        assert_eq!(log.get_context("last_created_file"), Some("new.rs"));
        assert_eq!(log.get_context("never_set"), None);
    }

    #[test]
    fn archive_then_clear_yields_empty_log() {
        let temp = tempfile::tempdir().unwrap();
        let mut log = ConversationLog::open(temp.path()).unwrap();
        log.append(Role::User, "hi", None, BTreeMap::new()).unwrap();
        log.archive();
        log.clear().unwrap();

        assert_eq!(log.summary().total, 0);

        let archive_content =
            std::fs::read_to_string(temp.path().join(HISTORY_DIR).join("all_history.json"))
                .unwrap();
        let sessions: Vec<serde_json::Value> = serde_json::from_str(&archive_content).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["conversation"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn archive_appends_across_sessions() {
        let temp = tempfile::tempdir().unwrap();
        for _ in 0..2 {
            let mut log = ConversationLog::open(temp.path()).unwrap();
            log.append(Role::User, "x", None, BTreeMap::new()).unwrap();
            log.archive();
            log.clear().unwrap();
        }
        let archive_content =
            std::fs::read_to_string(temp.path().join(HISTORY_DIR).join("all_history.json"))
                .unwrap();
        let sessions: Vec<serde_json::Value> = serde_json::from_str(&archive_content).unwrap();
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn recent_context_truncates_long_entries() {
        let (_temp, mut log) = open_log();
        log.append(Role::User, "a".repeat(500), None, BTreeMap::new())
            .unwrap();
        log.append(Role::Assistant, "short", None, BTreeMap::new())
            .unwrap();

        let context = log.recent_context(10);
        assert!(context.starts_with("Previous conversation:"));
        assert!(context.contains(&format!("User: {}...", "a".repeat(200))));
        assert!(context.contains("Assistant: short"));
    }

    #[test]
    fn recent_context_windows_last_entries() {
        let (_temp, mut log) = open_log();
        for i in 0..6 {
            log.append(Role::User, format!("msg{}", i), None, BTreeMap::new())
                .unwrap();
        }
        let context = log.recent_context(2);
        assert!(!context.contains("msg3"));
        assert!(context.contains("msg4"));
        assert!(context.contains("msg5"));
    }

    #[test]
    fn export_writes_titled_blocks() {
        let (temp, mut log) = open_log();
        log.append(Role::User, "generate a parser", Some("generate"), BTreeMap::new())
            .unwrap();
        let out = temp.path().join("export.md");
        let written = log.export(&out).unwrap();
        let content = std::fs::read_to_string(written).unwrap();
        assert!(content.starts_with("# Agent Conversation History"));
        assert!(content.contains("## User ("));
        assert!(content.contains("*Command: generate*"));
        assert!(content.contains("generate a parser"));
    }
}
