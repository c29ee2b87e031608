//! Context Composer
//!
//! Assembles the final generation prompt from a user instruction plus the
//! contents of referenced workspace files, each tagged with its detected
//! language, followed by fixed constraints that pin the model to the
//! reference language and style.

use crate::error::AgentError;
use crate::provider::{PredictionTransport, ReplicateClient};
use crate::workspace::{language_for_path, WorkspaceStore};

const SECTION_RULE: &str =
    "================================================================================";
const FILE_RULE: &str =
    "--------------------------------------------------------------------------------";

/// A referenced file resolved for one composition. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct FileReference {
    pub path: String,
    pub language: &'static str,
    pub content: String,
}

/// Prompt builder over the workspace store.
pub struct ContextComposer<'a> {
    store: &'a WorkspaceStore,
}

impl<'a> ContextComposer<'a> {
    pub fn new(store: &'a WorkspaceStore) -> Self {
        Self { store }
    }

    /// Compose the prompt and submit it to the model client, returning the
    /// generated text verbatim.
    pub async fn compose_and_generate<T: PredictionTransport>(
        &self,
        client: &ReplicateClient<T>,
        instruction: &str,
        explicit_paths: &[String],
    ) -> Result<String, AgentError> {
        let prompt = self.compose(instruction, explicit_paths);
        client.generate_code(&prompt).await
    }

    /// Build the composed prompt: instruction, one delimited block per
    /// referenced file, then the fixed generation constraints.
    ///
    /// An unreadable reference degrades to an inline error marker; it never
    /// aborts the composition.
    pub fn compose(&self, instruction: &str, explicit_paths: &[String]) -> String {
        let paths: Vec<String> = if explicit_paths.is_empty() {
            extract_quoted_paths(instruction)
        } else {
            explicit_paths.to_vec()
        };

        let mut context_section = String::new();
        if !paths.is_empty() {
            context_section.push_str("\n\nREFERENCE CODE FILES:\n");
            context_section.push_str(SECTION_RULE);
            context_section.push('\n');

            for path in &paths {
                match self.store.read(path) {
                    Ok(Some(content)) => {
                        let reference = FileReference {
                            language: language_for_path(path),
                            path: path.clone(),
                            content,
                        };
                        context_section.push_str(&format!(
                            "\nFILE: {}\nLANGUAGE: {}\n{}\n{}\n{}\n",
                            reference.path,
                            reference.language,
                            FILE_RULE,
                            reference.content,
                            FILE_RULE
                        ));
                    }
                    Ok(None) => {
                        tracing::debug!(path = %path, "referenced file not found");
                        context_section
                            .push_str(&format!("\n[ERROR reading {}: file not found]\n", path));
                    }
                    Err(e) => {
                        tracing::debug!(path = %path, error = %e, "referenced file unreadable");
                        context_section.push_str(&format!("\n[ERROR reading {}: {}]\n", path, e));
                    }
                }
            }
        }

        format!(
            "TASK: {}\n{}\n\nREQUIREMENTS:\n\
             1. Match the exact language of the reference files (TypeScript, Python, etc.)\n\
             2. Follow the same code style and patterns shown in the reference files\n\
             3. Use the same naming conventions and structure\n\
             4. Include appropriate error handling and logging\n\
             5. Add documentation comments where needed\n\
             6. DO NOT generate code in a different language than the references\n\
             7. Create code that would logically extend or adapt from the reference files\n\n\
             Generate the code now:",
            instruction, context_section
        )
    }
}

/// Treat every double-quoted substring of the instruction as a candidate
/// file path. Heuristic by contract: it can over- and under-match, and
/// unreadable candidates degrade to inline error markers downstream.
pub fn extract_quoted_paths(instruction: &str) -> Vec<String> {
    let mut paths = Vec::new();
    let mut rest = instruction;
    while let Some(start) = rest.find('"') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('"') else {
            break;
        };
        let candidate = &after[..end];
        if !candidate.is_empty() {
            paths.push(candidate.to_string());
        }
        rest = &after[end + 1..];
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::replicate::tests::{client, state, ScriptedTransport};
    use serde_json::json;
    use std::sync::atomic::Ordering;

    fn workspace() -> (tempfile::TempDir, WorkspaceStore) {
        let temp = tempfile::tempdir().unwrap();
        let store = WorkspaceStore::new(temp.path().join("ws")).unwrap();
        (temp, store)
    }

    #[test]
    fn quoted_substrings_become_candidate_paths() {
        let paths =
            extract_quoted_paths(r#"Create a variant of "sensors/temp.ts" like "ph.ts" please"#);
        assert_eq!(paths, vec!["sensors/temp.ts", "ph.ts"]);
    }

    #[test]
    fn unbalanced_quotes_stop_extraction() {
        assert_eq!(extract_quoted_paths(r#"only "one.ts" and "dangling"#), vec!["one.ts"]);
        assert!(extract_quoted_paths("no quotes here").is_empty());
    }

    #[test]
    fn compose_includes_file_blocks_with_language() {
        let (_temp, store) = workspace();
        store.write("service.ts", "export class Service {}").unwrap();

        let composer = ContextComposer::new(&store);
        let prompt = composer.compose(r#"Adapt "service.ts" for pH sensors"#, &[]);

        assert!(prompt.starts_with("TASK: Adapt"));
        assert!(prompt.contains("FILE: service.ts"));
        assert!(prompt.contains("LANGUAGE: TypeScript"));
        assert!(prompt.contains("export class Service {}"));
        assert!(prompt.contains("REQUIREMENTS:"));
        assert!(prompt.contains("DO NOT generate code in a different language"));
    }

    #[test]
    fn explicit_paths_override_extraction() {
        let (_temp, store) = workspace();
        store.write("real.py", "print('x')").unwrap();

        let composer = ContextComposer::new(&store);
        let prompt = composer.compose(r#"ignore "quoted.ts""#, &["real.py".to_string()]);

        assert!(prompt.contains("FILE: real.py"));
        assert!(!prompt.contains("quoted.ts\nLANGUAGE"));
    }

    #[test]
    fn unreadable_reference_becomes_inline_marker() {
        let (_temp, store) = workspace();
        let composer = ContextComposer::new(&store);
        let prompt = composer.compose(r#"Extend "ghost.ts" with retries"#, &[]);

        assert!(prompt.contains("[ERROR reading ghost.ts:"));
        assert!(prompt.contains("REQUIREMENTS:"));
    }

    #[tokio::test(start_paused = true)]
    async fn composition_with_bad_reference_still_calls_the_client() {
        let (_temp, store) = workspace();
        let composer = ContextComposer::new(&store);
        let transport = ScriptedTransport::new(vec![state("succeeded", Some(json!("generated")))]);
        let client = client(transport);

        let result = composer
            .compose_and_generate(&client, r#"Extend "missing.rs" somehow"#, &[])
            .await
            .unwrap();

        assert_eq!(result, "generated");
        assert_eq!(client.transport.created.load(Ordering::SeqCst), 1);
        let submitted = client.transport.last_prompt.lock().clone().unwrap();
        assert!(submitted.contains("[ERROR reading missing.rs:"));
    }
}
