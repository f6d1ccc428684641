// src/analyze/mod.rs
//! Feed analysis: local heuristics plus LLM-backed extraction and the feed agent.

pub mod ai_adapter;
pub mod cerebras;
pub mod feed_agent;
pub mod heuristics;
pub mod incident;
pub mod index;
pub mod openrouter;

pub use ai_adapter::{AiError, ChatMessage, CompletionGateway, DisabledGateway, DynGateway};
pub use cerebras::CerebrasClient;
pub use feed_agent::analyze_feed_with_ai;
pub use heuristics::{analyze, describe_feed, FeedAnalysis};
pub use incident::{incident_schema, StructuredIncident};
pub use openrouter::OpenRouterClient;
