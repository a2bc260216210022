// src/core/template/mod.rs

//! The template engine behind `esplus template`.
//!
//! A template is either a file (parsed with `{{ }}`) or the literal text given on the command
//! line (parsed with `[[ ]]`, which never clashes with espanso's own variables). Positional
//! arguments become the data context: one argument is bound as a string, several as a list.
//!
//! Rendering goes into a buffer first, so a template that fails halfway writes nothing.

mod exec;
mod format;
mod funcs;
mod lexer;
mod parser;
pub mod value;

use crate::models::{Delimiters, TemplateSource};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;
use value::Value;

/// Name used in error messages for every template.
const TEMPLATE_NAME: &str = "tmpl";

/// A lexer or parser failure, before the template name is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub(crate) line: usize,
    pub(crate) message: String,
}

/// Everything that can go wrong between reading a template and writing its output.
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template text could not be lexed or parsed.
    #[error("template: {name}:{line}: {message}")]
    Syntax {
        /// Template name.
        name: String,
        /// 1-based line of the offending token.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// `.` or `$` was read but no data was given.
    #[error("template: {name}:{line}: no data bound; cannot evaluate {what}")]
    UndefinedReference {
        /// Template name.
        name: String,
        /// 1-based line of the reference.
        line: usize,
        /// The reference that was read, `.` or `$`.
        what: String,
    },
    /// A function or field lookup failed while rendering.
    #[error("template: {name}:{line}: {message}")]
    Execution {
        /// Template name.
        name: String,
        /// 1-based line of the failing action.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// The template file exists but could not be read.
    #[error("could not read template file '{}': {source}", path.display())]
    Io {
        /// The template file.
        path: PathBuf,
        /// The underlying read error.
        #[source]
        source: io::Error,
    },
    /// The rendered output could not be written.
    #[error("could not write the rendered template: {0}")]
    Output(#[source] io::Error),
}

/// A compiled template, ready to be rendered any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    nodes: Vec<parser::Node>,
}

impl Template {
    /// Compiles `text` with the given delimiters and the standard function library.
    pub fn parse(name: &str, text: &str, delims: &Delimiters) -> Result<Self, TemplateError> {
        let to_error = |e: SyntaxError| TemplateError::Syntax {
            name: name.to_string(),
            line: e.line,
            message: e.message,
        };
        let tokens = lexer::lex(text, delims).map_err(to_error)?;
        let nodes = parser::parse(&tokens, &funcs::is_function).map_err(to_error)?;
        log::trace!("Parsed template '{}' into {} nodes", name, nodes.len());
        Ok(Self {
            name: name.to_string(),
            nodes,
        })
    }

    /// Renders the template against `data`. `None` leaves `.` and `$` unbound.
    pub fn render(&self, data: Option<Value>) -> Result<String, TemplateError> {
        exec::Executor::new(&self.name, data).run(&self.nodes)
    }
}

/// Decides whether `arg` names a template file or is the template text itself.
///
/// Anything that can be `stat`ed counts as a file. Any other outcome, including errors such
/// as "name too long" for long inline templates, means inline text.
pub fn resolve_source(arg: &str) -> TemplateSource {
    match fs::metadata(arg) {
        Ok(_) => TemplateSource::File(PathBuf::from(arg)),
        Err(_) => TemplateSource::Inline(arg.to_string()),
    }
}

/// Returns the template body for a resolved source.
pub fn load_source(source: &TemplateSource) -> Result<String, TemplateError> {
    match source {
        TemplateSource::File(path) => fs::read_to_string(path).map_err(|e| TemplateError::Io {
            path: path.clone(),
            source: e,
        }),
        TemplateSource::Inline(text) => Ok(text.clone()),
    }
}

/// Binds positional arguments: none leaves the context unbound, one is a string,
/// several are a list of strings.
pub fn data_context(args: &[String]) -> Option<Value> {
    match args {
        [] => None,
        [single] => Some(Value::from(single.as_str())),
        many => Some(Value::from(many.to_vec())),
    }
}

/// Resolves, compiles and renders a template, then writes the result to `out`.
///
/// `args` is the full argument list after the sub-command name: the source first, then the
/// data. An empty list is a no-op.
pub fn render_source<W: Write>(args: &[String], out: &mut W) -> Result<(), TemplateError> {
    let Some((source_arg, data_args)) = args.split_first() else {
        return Ok(());
    };

    let source = resolve_source(source_arg);
    log::debug!("Template source resolved as {:?}", source);

    let text = load_source(&source)?;
    let template = Template::parse(TEMPLATE_NAME, &text, &source.delimiters())?;
    let rendered = template.render(data_context(data_args))?;

    out.write_all(rendered.as_bytes())
        .and_then(|()| out.flush())
        .map_err(TemplateError::Output)
}
