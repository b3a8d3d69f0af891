//! Backend for a browser extension that gives progressive hints and chat
//! explanations for programming problems, backed by OpenAI-compatible LLMs.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod services;
