//! # System Interaction Layer
//!
//! The boundary between esplus and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: starts external processes, immediately or after a delay, detached from
//!   esplus so they keep running after it exits. Also runs a command with text on its stdin.
//! - **`clipboard`**: reads the desktop clipboard and decides where the clipboard bridge sends
//!   its content.

pub mod clipboard;
pub mod executor;
