//! LLM Integration Module
//!
//! Chat-completion client with tool-calling support, behind the `ChatClient`
//! trait so every consumer (planner, subagents, skill runner) can be driven
//! by a scripted client in tests.

pub mod client;

pub use client::{
    ChatClient, ChatRequest, ChatResponse, Choice, FunctionCall, Message, OpenRouterClient,
    ToolCallRequest, Usage,
};
