// src/cli/handlers/mod.rs

// One module per sub-command. Each exposes `handle(args, &AppContext)`.

pub mod clipin;
pub mod help;
pub mod run;
pub mod template;
pub mod wait;
