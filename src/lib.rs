//! # esplus
//!
//! A small helper CLI for the espanso text expander. It renders Go-style text templates,
//! launches processes (optionally after a delay) without blocking the caller, and pipes the
//! clipboard into commands or templates.
//!
//! - [`cli`]: top-level argument parsing, the command registry and the sub-command handlers.
//! - [`core`]: the template engine, the alias resolver and configuration paths.
//! - [`system`]: process launching and clipboard access.

include!(concat!(env!("OUT_DIR"), "/messages.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;
