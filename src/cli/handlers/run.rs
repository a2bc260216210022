use crate::{cli::dispatcher::AppContext, system::executor::Launcher};
use anyhow::Result;

///
/// Main entry point for the 'run' command.
/// `args[0]` is either a delay in milliseconds or the program to start.
///
pub fn handle(args: Vec<String>, context: &AppContext) -> Result<()> {
    if let Some(launched) = Launcher::new(&context.aliases).run(&args)? {
        log::debug!("'{}' started with pid {}", launched.program, launched.pid);
    }
    Ok(())
}
