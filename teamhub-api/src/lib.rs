//! # TeamHub API Server Library
//!
//! HTTP surface for the TeamHub collaboration backend. All domain rules
//! live in `teamhub-core`; this crate translates HTTP requests into engine
//! calls and engine errors into status codes.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Session and list-query extractors
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
