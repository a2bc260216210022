use crate::cli::{build_help_string, dispatcher::AppContext, version_string};
use anyhow::Result;

/// Prints the full help text. Also used when esplus is called without arguments.
pub fn handle(_args: Vec<String>, _context: &AppContext) -> Result<()> {
    print!("{}", build_help_string());
    Ok(())
}

/// Prints the version banner.
pub fn handle_version(_args: Vec<String>, _context: &AppContext) -> Result<()> {
    println!("{}", version_string());
    Ok(())
}
