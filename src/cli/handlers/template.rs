use crate::{cli::dispatcher::AppContext, core::template};
use anyhow::Result;
use std::io;

/// Entry point for `esplus template <file-or-template> [args...]`.
pub fn handle(args: Vec<String>, _context: &AppContext) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    template::render_source(&args, &mut out)?;
    Ok(())
}
