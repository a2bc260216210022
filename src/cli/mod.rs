use clap::Parser;

pub mod dispatcher;
pub mod handlers;

/// Builds the color-aware help text at runtime.
///
/// The message template marks up its parts with `<title>`, `<cmd>`, `<hl>` and `<dim>` tags,
/// which become ANSI styles on a terminal and disappear everywhere else.
pub fn build_help_string() -> String {
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();

    let template = t!("cli.help.template");

    let title = if use_colors { "\x1b[1;33m" } else { "" }; // Bold Yellow
    let hl = if use_colors { "\x1b[1;36m" } else { "" }; // Bold Cyan
    let cmd = if use_colors { "\x1b[36m" } else { "" }; // Cyan
    let dim = if use_colors { "\x1b[2m" } else { "" };
    let reset = if use_colors { "\x1b[0m" } else { "" };

    template
        .replace("<version>", env!("CARGO_PKG_VERSION"))
        .replace("<title>", title)
        .replace("</title>", reset)
        .replace("<hl>", hl)
        .replace("</hl>", reset)
        .replace("<cmd>", cmd)
        .replace("</cmd>", reset)
        .replace("<dim>", dim)
        .replace("</dim>", reset)
}

/// The one-line version banner, e.g. `esplus 0.4.0`.
pub fn version_string() -> String {
    t!("cli.version.template").replace("{version}", env!("CARGO_PKG_VERSION"))
}

/// esplus: a helper cli for espanso.
///
/// Every argument is collected as-is and routed by the command registry, including `-h` and
/// `--version`, so clap's own help and version handling is switched off.
#[derive(Parser, Debug)]
#[command(name = "esplus", author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// The sub-command followed by its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
