//! Wellness Core
//!
//! Domain logic for the wellness check-in assistant: the local check-in
//! history, the prompt context built from it, the Notion-backed todo list
//! and the tool registry the language model calls into.

pub mod agent;
pub mod checkin;
pub mod context;
pub mod history;
pub mod llm_client;
pub mod notion;
pub mod persister;
pub mod replies;
pub mod tasks;
