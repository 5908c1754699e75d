//! Core library for the Botica retail assistant.
//!
//! This crate contains everything behind the chat surface: the normalization
//! pipeline that turns nine structurally distinct brand spreadsheets into
//! canonical product records, the corpus and vector-index builders, the
//! inventory synchronization against the hosted stock sheet, the tool layer
//! the assistant calls mid-conversation, and the per-session orchestration
//! of the hosted assistant's run protocol.
//!
//! # Architecture Overview
//!
//! - **Normalization**: bullet stripping, unit squashing, keyword
//!   deduplication and sentence composition shared by every brand adapter
//! - **Brand catalog**: declarative per-brand schema table mapping raw
//!   worksheets onto {Producto, Código, Descripción} records
//! - **Corpus & index**: per-brand text files embedded into a wholesale
//!   rebuilt vector index with {brand, EAN} metadata
//! - **Inventory**: snapshot pull with zero-stock filtering, and the
//!   bounded-retry price write-back
//! - **Tools**: registry of the named functions the assistant may invoke
//! - **Session**: per-session context object and the run event loop, with
//!   batched tool-output submission and idle log export

pub mod assistant;
pub mod catalog;
pub mod config;
pub mod core_types;
pub mod corpus;
pub mod errors;
pub mod export;
pub mod inventory;
pub mod normalize;
pub mod rag;
pub mod session;
pub mod sheets;
pub mod tools;

pub use assistant::{AssistantClient, HttpAssistantClient, RunEvent};
pub use config::BoticaConfig;
pub use errors::AssistantError;
pub use rag::Retriever;
pub use session::{ChatSession, Orchestrator, SessionState};
pub use tools::ToolRegistry;
