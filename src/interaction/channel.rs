//! Session-channel interaction bridge for server use.
//!
//! Log lines become `log` events on the session's outbound channel; plan
//! review emits a `plan_review` event and blocks on the session's response
//! channel until the human replies or the session is cancelled.

use crate::interaction::InteractionHandler;
use crate::planner::Plan;
use crate::session::Event;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub struct ChannelInteraction {
    event_tx: UnboundedSender<Event>,
    response_rx: Mutex<UnboundedReceiver<String>>,
    cancel: CancellationToken,
    /// Set while review_plan is blocked; `post_response` consults it.
    awaiting_response: Arc<AtomicBool>,
}

impl ChannelInteraction {
    pub fn new(
        event_tx: UnboundedSender<Event>,
        response_rx: UnboundedReceiver<String>,
        cancel: CancellationToken,
        awaiting_response: Arc<AtomicBool>,
    ) -> Self {
        Self {
            event_tx,
            response_rx: Mutex::new(response_rx),
            cancel,
            awaiting_response,
        }
    }
}

#[async_trait]
impl InteractionHandler for ChannelInteraction {
    async fn log(&self, line: &str) {
        let _ = self.event_tx.send(Event::log(line));
    }

    async fn review_plan(&self, plan: &Plan) -> Result<Option<String>, String> {
        let mut response_rx = self.response_rx.lock().await;

        // The flag goes up before the event so a prompt reply arriving right
        // after the client sees plan_review is never rejected.
        self.awaiting_response.store(true, Ordering::SeqCst);
        if self
            .event_tx
            .send(Event::PlanReview { plan: plan.clone() })
            .is_err()
        {
            self.awaiting_response.store(false, Ordering::SeqCst);
            return Err("Event channel closed during plan review".to_string());
        }
        let reply = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err("Plan review cancelled".to_string()),
            reply = response_rx.recv() => {
                reply.ok_or_else(|| "Response channel closed during plan review".to_string())
            }
        };
        self.awaiting_response.store(false, Ordering::SeqCst);

        let reply = reply?;
        let reply = reply.trim().to_string();
        if reply.is_empty() {
            Ok(None)
        } else {
            Ok(Some(reply))
        }
    }

    // The event protocol has no search-review or tool-approval variants, so
    // the bridge never asks for more results and pre-approves tool calls.
    async fn review_search_results(&self, _results: &str) -> bool {
        false
    }

    async fn approve_tool(&self, _name: &str, _arguments: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{Plan, Task, TaskType};
    use tokio::sync::mpsc;

    fn plan() -> Plan {
        Plan::new("goal", vec![Task::new(0, TaskType::Search, "find")])
    }

    #[tokio::test]
    async fn test_empty_reply_approves() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let awaiting = Arc::new(AtomicBool::new(false));
        let handler = ChannelInteraction::new(
            event_tx,
            response_rx,
            CancellationToken::new(),
            awaiting.clone(),
        );

        response_tx.send("  ".to_string()).unwrap();
        let reply = handler.review_plan(&plan()).await.unwrap();
        assert!(reply.is_none());
        assert!(!awaiting.load(Ordering::SeqCst));

        match event_rx.recv().await.unwrap() {
            Event::PlanReview { plan } => assert_eq!(plan.description, "goal"),
            other => panic!("expected plan_review, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_modification_reply_is_returned() {
        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let handler = ChannelInteraction::new(
            event_tx,
            response_rx,
            CancellationToken::new(),
            Arc::new(AtomicBool::new(false)),
        );

        response_tx.send("Add a security task.".to_string()).unwrap();
        let reply = handler.review_plan(&plan()).await.unwrap();
        assert_eq!(reply.as_deref(), Some("Add a security task."));
    }

    #[tokio::test]
    async fn test_cancellation_unblocks_review() {
        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        let (_response_tx, response_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handler = ChannelInteraction::new(
            event_tx,
            response_rx,
            cancel.clone(),
            Arc::new(AtomicBool::new(false)),
        );

        cancel.cancel();
        let err = handler.review_plan(&plan()).await.unwrap_err();
        assert!(err.contains("cancelled"));
    }

    #[tokio::test]
    async fn test_log_becomes_event() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (_response_tx, response_rx) = mpsc::unbounded_channel();
        let handler = ChannelInteraction::new(
            event_tx,
            response_rx,
            CancellationToken::new(),
            Arc::new(AtomicBool::new(false)),
        );

        handler.log("progress line").await;
        match event_rx.recv().await.unwrap() {
            Event::Log { content } => assert_eq!(content, "progress line"),
            other => panic!("expected log, got {:?}", other),
        }
    }
}
