use crate::session::Event;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

/// Server-side state of one session, shared between the manager and the
/// orchestrator task that owns it.
pub struct SessionHandle {
    pub id: String,
    pub(crate) response_tx: UnboundedSender<String>,
    pub cancel: CancellationToken,
    /// True while the orchestrator is blocked on the response channel.
    pub(crate) awaiting_response: Arc<AtomicBool>,
    /// True once the terminal event has been emitted.
    pub(crate) terminated: Arc<AtomicBool>,
    /// True once the transport has drained the event channel.
    pub(crate) drained: AtomicBool,
    /// Free-form user guidance appended to every subagent system prompt.
    pub(crate) global_context: Mutex<String>,
}

impl SessionHandle {
    pub(crate) fn new(id: &str, response_tx: UnboundedSender<String>) -> Self {
        Self {
            id: id.to_string(),
            response_tx,
            cancel: CancellationToken::new(),
            awaiting_response: Arc::new(AtomicBool::new(false)),
            terminated: Arc::new(AtomicBool::new(false)),
            drained: AtomicBool::new(false),
            global_context: Mutex::new(String::new()),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response.load(Ordering::SeqCst)
    }

    /// A session may be replaced only after its token fired and its event
    /// channel was drained, so events never cross between incarnations.
    pub(crate) fn is_replaceable(&self) -> bool {
        (self.cancel.is_cancelled() || self.is_terminated())
            && self.drained.load(Ordering::SeqCst)
    }
}

/// Caller-facing side of a started session: the streamed event channel.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub events: UnboundedReceiver<Event>,
}

/// Generate a short numeric session id for CLI-created sessions. Server
/// sessions use client-supplied opaque ids instead.
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let id: u16 = rng.gen_range(1000..10000);
    id.to_string()
}
