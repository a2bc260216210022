// src/core/mod.rs

pub mod aliases;
pub mod config_loader;
pub mod paths;
pub mod template;
