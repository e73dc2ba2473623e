pub mod adapters;
pub mod ai_context;
pub mod config;
pub mod error;
pub mod web;
