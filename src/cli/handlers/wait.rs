use crate::{cli::dispatcher::AppContext, system::executor::Launcher};
use anyhow::Result;

/// Entry point for `esplus wait <milliseconds> <cmd> [args...]`.
///
/// Normally invoked by `run` in a background process rather than by hand.
pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    Launcher::new(&context.aliases).wait(&args)?;
    Ok(())
}
