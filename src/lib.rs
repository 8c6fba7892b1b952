//! Property Chat API Library
//!
//! Backend for the property microsite assistant: visitors chat about a listing,
//! every message is scored for buyer intent, and the listing agent is notified
//! once a visitor qualifies as a lead.
//!
//! # Modules
//!
//! - `api`: Router and handler namespace.
//! - `core`: Lead scoring and chat bookkeeping.
//! - `data`: Data access layer.
//! - `integrations`: External service integrations.
//! - `chat`: Per-turn lead state updates.
//! - `config`: Configuration management.
//! - `db`: Database connection and pool management.
//! - `db_storage`: Property and chat session queries.
//! - `errors`: Error handling types.
//! - `follow_up`: Score-band questions and suggested actions.
//! - `handlers`: HTTP request handlers.
//! - `lead_signals`: Keyword signal and interest extraction, score arithmetic.
//! - `llm_client`: Chat-completions client.
//! - `models`: Database and API models.
//! - `notifier`: Lead notification webhook client.
//! - `prompt`: LLM prompt assembly.
//! - `stats`: Dashboard aggregation.
//! - `visitor`: Visitor contact validation and fingerprinting.

pub mod api;
pub mod core;
pub mod data;
pub mod integrations;

pub mod chat;
pub mod config;
pub mod db;
pub mod db_storage;
pub mod errors;
pub mod follow_up;
pub mod handlers;
pub mod lead_signals;
pub mod llm_client;
pub mod models;
pub mod notifier;
pub mod prompt;
pub mod stats;
pub mod visitor;
