//! Bavard is a line-oriented French chat assistant backed by the Gemini API.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the retrying request dispatcher, the generation and
//!   summary clients, the response router and the chat session.
//! - [`commands`] intercepts `/help` and `/wiki <term>` before anything
//!   reaches the network.
//! - [`ui`] presents the transcript, revealing replies with a typewriter
//!   effect.
//! - [`api`] defines the wire payloads of both remote services.
//! - [`auth`] resolves the API key from the environment or the keyring.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod core;
pub mod ui;
pub mod utils;
