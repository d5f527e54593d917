use crate::agents::build_subagents;
use crate::config::{AgentConfig, PODCAST_DIRECTIVE, PPT_DIRECTIVE};
use crate::interaction::ChannelInteraction;
use crate::llm::{ChatClient, OpenRouterClient};
use crate::planner::{PlanExecutor, Planner};
use crate::session::session::{Session, SessionHandle};
use crate::tools::web::{DuckDuckGoClient, SearchProvider, TavilyClient, WikipediaClient};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Per-request flags carried by `start`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartFlags {
    pub request_ppt: bool,
    pub request_podcast: bool,
}

/// Capabilities advertised to the transport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Capabilities {
    pub ppt: bool,
    pub podcast: bool,
}

/// Owns the `session_id -> Session` mapping and spawns one orchestrator
/// task per session. The LLM client and search back-ends are shared
/// read-only across sessions.
pub struct SessionManager {
    config: AgentConfig,
    client: Arc<dyn ChatClient>,
    primary: Arc<dyn SearchProvider>,
    secondary: Arc<dyn SearchProvider>,
    wikipedia: Arc<dyn SearchProvider>,
    sessions: Mutex<HashMap<String, Arc<SessionHandle>>>,
}

impl SessionManager {
    pub fn new(
        config: AgentConfig,
        client: Arc<dyn ChatClient>,
        primary: Arc<dyn SearchProvider>,
        secondary: Arc<dyn SearchProvider>,
        wikipedia: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            config,
            client,
            primary,
            secondary,
            wikipedia,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Build a manager with the production back-ends from configuration.
    pub fn from_config(config: AgentConfig) -> Self {
        let client = Arc::new(OpenRouterClient::with_base_url(
            config.api_key.clone(),
            config.base_url.clone(),
        ));
        let primary = Arc::new(TavilyClient::new(config.tavily_api_key.clone()));
        let secondary = Arc::new(DuckDuckGoClient::new());
        let wikipedia = Arc::new(WikipediaClient::new());
        Self::new(config, client, primary, secondary, wikipedia)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            ppt: self.config.ppt_enabled,
            podcast: self.config.podcast_enabled,
        }
    }

    /// Start a session: allocate its channels, spawn the orchestrator task
    /// and hand back the event stream. An id stays taken until its previous
    /// incarnation was cancelled or finished and drained.
    pub fn start(&self, id: &str, request: &str, flags: StartFlags) -> Result<Session, String> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let handle = Arc::new(SessionHandle::new(id, response_tx));

        {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(existing) = sessions.get(id) {
                if !existing.is_replaceable() {
                    return Err(format!("Session '{}' is already active", id));
                }
            }
            sessions.insert(id.to_string(), handle.clone());
        }

        let mut request = request.to_string();
        if flags.request_ppt {
            request.push_str(PPT_DIRECTIVE);
        }
        if flags.request_podcast {
            request.push_str(PODCAST_DIRECTIVE);
        }

        let interaction = Arc::new(ChannelInteraction::new(
            event_tx.clone(),
            response_rx,
            handle.cancel.clone(),
            handle.awaiting_response.clone(),
        ));
        let subagents = build_subagents(
            &self.config,
            self.client.clone(),
            self.primary.clone(),
            self.secondary.clone(),
            self.wikipedia.clone(),
            interaction.clone(),
        );
        let planner = Arc::new(Planner::new(self.client.clone(), &self.config.model));
        let executor = PlanExecutor::new(planner, subagents, interaction, event_tx)
            .with_review(self.config.require_review);

        let cancel = handle.cancel.clone();
        let terminated = handle.terminated.clone();
        let global_context = handle.global_context.lock().unwrap().clone();
        log::info!("session '{}' started", id);
        tokio::spawn(async move {
            executor.run(&cancel, &request, &global_context).await;
            terminated.store(true, Ordering::SeqCst);
        });

        Ok(Session {
            id: id.to_string(),
            events: event_rx,
        })
    }

    /// Answer a pending review. Errors when the session does not exist or
    /// nothing is waiting for a response.
    pub fn post_response(&self, id: &str, text: &str) -> Result<(), String> {
        let handle = self.handle(id)?;
        if !handle.is_awaiting_response() {
            return Err(format!("Session '{}' has no pending review", id));
        }
        handle
            .response_tx
            .send(text.to_string())
            .map_err(|_| format!("Session '{}' is no longer listening for responses", id))
    }

    /// Fire the session's cancellation token. The orchestrator observes it
    /// at every suspension point.
    pub fn cancel(&self, id: &str) -> Result<(), String> {
        let handle = self.handle(id)?;
        log::info!("session '{}' cancelled", id);
        handle.cancel.cancel();
        Ok(())
    }

    /// Mark the event channel drained and release the session entry once it
    /// has reached a terminal state.
    pub fn drain(&self, id: &str) -> Result<(), String> {
        let mut sessions = self.sessions.lock().unwrap();
        let handle = sessions
            .get(id)
            .ok_or_else(|| format!("Session '{}' not found", id))?;
        handle.drained.store(true, Ordering::SeqCst);
        if handle.is_terminated() || handle.cancel.is_cancelled() {
            sessions.remove(id);
        }
        Ok(())
    }

    /// Set the free-form guidance appended to every subagent system prompt.
    /// Takes effect for requests started afterwards.
    pub fn set_global_context(&self, id: &str, text: &str) -> Result<(), String> {
        let handle = self.handle(id)?;
        *handle.global_context.lock().unwrap() = text.to_string();
        Ok(())
    }

    fn handle(&self, id: &str) -> Result<Arc<SessionHandle>, String> {
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| format!("Session '{}' not found", id))
    }
}
