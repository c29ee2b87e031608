//! Conversation log lifecycle: persist, archive, clear, export.

use blink::session::{ConversationLog, Role};
use std::collections::BTreeMap;
use tempfile::TempDir;

#[test]
fn session_survives_process_restart() {
    let temp = TempDir::new().unwrap();

    {
        let mut log = ConversationLog::open(temp.path()).unwrap();
        log.append(Role::User, "make a parser", Some("generate"), BTreeMap::new())
            .unwrap();
        log.append(Role::Assistant, "fn parse() {}", Some("generate"), BTreeMap::new())
            .unwrap();
        log.set_context("last_created_file", "parser.rs").unwrap();
    }

    let log = ConversationLog::open(temp.path()).unwrap();
    assert_eq!(log.entries().len(), 2);
    assert_eq!(log.get_context("last_created_file"), Some("parser.rs"));

    let summary = log.summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.user_messages, 1);
    assert_eq!(summary.commands.get("generate"), Some(&1));
    assert_eq!(summary.context_entries, 1);
}

#[test]
fn archive_then_clear_leaves_an_empty_session_and_a_full_archive() {
    let temp = TempDir::new().unwrap();

    for round in 0..3 {
        let mut log = ConversationLog::open(temp.path()).unwrap();
        log.append(Role::User, format!("round {}", round), Some("read"), BTreeMap::new())
            .unwrap();
        log.archive();
        log.clear().unwrap();
        assert_eq!(log.summary().total, 0);
    }

    let archive = temp.path().join(".blink_history/all_history.json");
    let sessions: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(archive).unwrap()).unwrap();
    assert_eq!(sessions.len(), 3);
    for session in &sessions {
        assert!(session.get("session_date").is_some());
        assert_eq!(session["conversation"].as_array().unwrap().len(), 1);
    }
}

#[test]
fn corrupted_archive_is_tolerated() {
    let temp = TempDir::new().unwrap();
    let history_dir = temp.path().join(".blink_history");
    std::fs::create_dir_all(&history_dir).unwrap();
    std::fs::write(history_dir.join("all_history.json"), "not json at all").unwrap();

    let mut log = ConversationLog::open(temp.path()).unwrap();
    log.append(Role::User, "hello", None, BTreeMap::new()).unwrap();
    log.archive();

    let sessions: Vec<serde_json::Value> = serde_json::from_str(
        &std::fs::read_to_string(history_dir.join("all_history.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(sessions.len(), 1);
}

#[test]
fn export_produces_a_markdown_transcript() {
    let temp = TempDir::new().unwrap();
    let mut log = ConversationLog::open(temp.path()).unwrap();
    log.append(Role::User, "show me main.rs", Some("read"), BTreeMap::new())
        .unwrap();
    log.append(Role::Assistant, "Displayed main.rs", Some("read"), BTreeMap::new())
        .unwrap();

    let target = temp.path().join("transcript.md");
    log.export(&target).unwrap();

    let content = std::fs::read_to_string(target).unwrap();
    assert!(content.starts_with("# Agent Conversation History"));
    assert!(content.contains("## User ("));
    assert!(content.contains("## Assistant ("));
    assert!(content.contains("show me main.rs"));
}
