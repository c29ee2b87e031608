//! Code agent facade: wires the workspace store, conversation log, and model
//! client together behind the operations the REPL drives.

use crate::compose::ContextComposer;
use crate::config::BlinkConfig;
use crate::credential::ApiCredential;
use crate::error::AgentError;
use crate::provider::{HttpPredictionTransport, ReplicateClient};
use crate::session::ConversationLog;
use crate::workspace::WorkspaceStore;
use parking_lot::Mutex;
use std::sync::Arc;

pub struct CodeAgent {
    store: WorkspaceStore,
    log: Arc<Mutex<ConversationLog>>,
    client: ReplicateClient<HttpPredictionTransport>,
}

impl CodeAgent {
    /// Build the agent from configuration and an injected credential.
    pub fn new(config: &BlinkConfig, credential: &ApiCredential) -> Result<Self, AgentError> {
        let store = WorkspaceStore::new(&config.workspace_root)?;
        let log = ConversationLog::open(store.root())?;
        let client = ReplicateClient::new(&config.provider, credential);
        Ok(Self {
            store,
            log: Arc::new(Mutex::new(log)),
            client,
        })
    }

    pub fn store(&self) -> &WorkspaceStore {
        &self.store
    }

    /// Shared handle to the conversation log; the interrupt handler holds a
    /// clone so it can archive on the way out.
    pub fn log(&self) -> Arc<Mutex<ConversationLog>> {
        Arc::clone(&self.log)
    }

    pub fn client(&self) -> &ReplicateClient<HttpPredictionTransport> {
        &self.client
    }

    /// Generate code for an instruction with referenced files inlined into
    /// the prompt. Empty `explicit_paths` falls back to quoted-substring
    /// extraction from the instruction.
    pub async fn generate_with_context(
        &self,
        instruction: &str,
        explicit_paths: &[String],
    ) -> Result<String, AgentError> {
        let composer = ContextComposer::new(&self.store);
        composer
            .compose_and_generate(&self.client, instruction, explicit_paths)
            .await
    }

    /// Read a file and run the analysis template over it. `Ok(None)` when
    /// the file does not exist.
    pub async fn analyze_file(
        &self,
        path: &str,
        task: &str,
    ) -> Result<Option<String>, AgentError> {
        let Some(code) = self.store.read(path)? else {
            return Ok(None);
        };
        self.client.analyze_code(&code, task).await.map(Some)
    }

    /// Read a template file and generate a re-targeted version of it.
    /// `Ok(None)` when the template does not exist.
    pub async fn extend_template(
        &self,
        template_path: &str,
        description: &str,
    ) -> Result<Option<String>, AgentError> {
        let Some(template) = self.store.read(template_path)? else {
            return Ok(None);
        };
        let specification = format!(
            "Create a new version of this code:\n\n\
             Original (template):\n{}\n\n\
             Make it about: {}\n\n\
             Keep the same structure and patterns as the original but adapt it for the new \
             context.",
            template, description
        );
        self.client.generate_code(&specification).await.map(Some)
    }

    /// Produce an ordered plan for an objective.
    pub async fn plan(&self, objective: &str) -> Result<Vec<String>, AgentError> {
        self.client.plan_tasks(objective).await
    }
}
