// src/core/template/parser.rs

//! Builds the template tree from the lexer's token stream.
//!
//! Function names and variables are resolved here, so a template that calls an unknown
//! function or reads an undeclared variable fails to compile instead of failing halfway
//! through rendering.

use super::SyntaxError;
use super::lexer::{Keyword, Spanned, Token};

/// How deeply blocks and parenthesized pipelines may nest.
///
/// Parsing and execution recurse once per level, so the limit keeps both well inside a
/// thread's stack.
pub(crate) const MAX_NESTING_DEPTH: usize = 100;

/// A node of the parsed template.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Text(String),
    Action(Pipeline),
    If(Branch),
    Range(Branch),
    With(Branch),
    Break(usize),
    Continue(usize),
}

/// The shared shape of `if`, `range` and `with`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Branch {
    pub(crate) pipe: Pipeline,
    pub(crate) body: Vec<Node>,
    pub(crate) otherwise: Vec<Node>,
}

/// Commands joined by `|`, optionally declaring or assigning variables.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Pipeline {
    pub(crate) line: usize,
    pub(crate) decl: Vec<String>,
    pub(crate) is_assign: bool,
    pub(crate) cmds: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Command {
    pub(crate) args: Vec<Operand>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Dot,
    Field(Vec<String>),
    Variable { name: String, fields: Vec<String> },
    Function(String),
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Nil,
    Pipe(Box<Pipeline>),
}

impl Operand {
    fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Str(_) | Self::Int(_) | Self::Float(_) | Self::Bool(_) | Self::Nil
        )
    }
}

/// How a list of nodes ended.
#[derive(Debug, PartialEq, Eq)]
enum Terminator {
    Eof,
    End,
    Else,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    If,
    Range,
    With,
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    is_function: &'a dyn Fn(&str) -> bool,
    vars: Vec<String>,
    range_depth: usize,
    depth: usize,
}

/// Parses a token stream into a list of nodes.
///
/// `is_function` decides which identifiers name callable functions.
pub(crate) fn parse(
    tokens: &[Spanned],
    is_function: &dyn Fn(&str) -> bool,
) -> Result<Vec<Node>, SyntaxError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        is_function,
        vars: vec!["$".to_string()],
        range_depth: 0,
        depth: 0,
    };
    let (nodes, terminator) = parser.parse_list()?;
    match terminator {
        Terminator::Eof => Ok(nodes),
        Terminator::End => Err(parser.error("unexpected {{end}}")),
        Terminator::Else => Err(parser.error("unexpected {{else}}")),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Text(_) => "text".to_string(),
        Token::LeftDelim => "left delimiter".to_string(),
        Token::RightDelim => "right delimiter".to_string(),
        Token::Keyword(k) => format!("<{}>", format!("{:?}", k).to_lowercase()),
        Token::Identifier(name) => format!("<{}>", name),
        Token::Field(fields) => format!("<.{}>", fields.join(".")),
        Token::Dot => "<.>".to_string(),
        Token::Variable { name, .. } => format!("<{}>", name),
        Token::Str(s) => format!("{:?}", s),
        Token::Number(n) => format!("<{}>", n),
        Token::Bool(b) => format!("<{}>", b),
        Token::Nil => "<nil>".to_string(),
        Token::Pipe => "\"|\"".to_string(),
        Token::LeftParen => "\"(\"".to_string(),
        Token::RightParen => "\")\"".to_string(),
        Token::Declare => "\":=\"".to_string(),
        Token::Assign => "\"=\"".to_string(),
        Token::Comma => "\",\"".to_string(),
    }
}

/// Parses an integer or float literal, accepting a sign, `0x`/`0o`/`0b` prefixes and `_`.
fn parse_number(literal: &str) -> Option<Operand> {
    let cleaned = literal.replace('_', "");
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };
    let radix_parts = [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)];
    for (prefix, radix) in radix_parts {
        if let Some(body) = digits.strip_prefix(prefix) {
            let value = i64::from_str_radix(body, radix).ok()?;
            return Some(Operand::Int(if negative { -value } else { value }));
        }
    }
    if let Ok(value) = digits.parse::<i64>() {
        return Some(Operand::Int(if negative { -value } else { value }));
    }
    let value = digits.parse::<f64>().ok()?;
    Some(Operand::Float(if negative { -value } else { value }))
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |s| s.line)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line: self.line(),
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: &Token, context: &str) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(token) if token == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(self.error(format!(
                "unexpected {} in {}",
                describe(token),
                context
            ))),
            None => Err(self.error(format!("unexpected EOF in {}", context))),
        }
    }

    /// Runs `parse` one nesting level deeper, failing once the limit is reached.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error("max expression depth exceeded"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_list(&mut self) -> Result<(Vec<Node>, Terminator), SyntaxError> {
        let mut nodes = Vec::new();
        while let Some(token) = self.next() {
            match token {
                Token::Text(text) => nodes.push(Node::Text(text)),
                Token::LeftDelim => match self.peek() {
                    Some(Token::Keyword(Keyword::End)) => {
                        self.pos += 1;
                        self.expect(&Token::RightDelim, "end")?;
                        return Ok((nodes, Terminator::End));
                    }
                    Some(Token::Keyword(Keyword::Else)) => {
                        self.pos += 1;
                        return Ok((nodes, Terminator::Else));
                    }
                    Some(Token::Keyword(Keyword::If)) => {
                        self.pos += 1;
                        nodes.push(self.parse_control(Control::If)?);
                    }
                    Some(Token::Keyword(Keyword::Range)) => {
                        self.pos += 1;
                        nodes.push(self.parse_control(Control::Range)?);
                    }
                    Some(Token::Keyword(Keyword::With)) => {
                        self.pos += 1;
                        nodes.push(self.parse_control(Control::With)?);
                    }
                    Some(Token::Keyword(keyword @ (Keyword::Break | Keyword::Continue))) => {
                        let keyword = *keyword;
                        let line = self.line();
                        if self.range_depth == 0 {
                            return Err(self.error(format!(
                                "{{{{{}}}}} outside {{{{range}}}}",
                                format!("{:?}", keyword).to_lowercase()
                            )));
                        }
                        self.pos += 1;
                        self.expect(&Token::RightDelim, "break/continue")?;
                        nodes.push(if keyword == Keyword::Break {
                            Node::Break(line)
                        } else {
                            Node::Continue(line)
                        });
                    }
                    _ => {
                        let pipe = self.parse_pipeline("command", true, 1)?;
                        self.expect(&Token::RightDelim, "command")?;
                        nodes.push(Node::Action(pipe));
                    }
                },
                other => {
                    return Err(self.error(format!("unexpected {}", describe(&other))));
                }
            }
        }
        Ok((nodes, Terminator::Eof))
    }

    /// Parses `if`, `range` or `with` after its keyword, up to and including `{{end}}`.
    fn parse_control(&mut self, control: Control) -> Result<Node, SyntaxError> {
        self.nested(|parser| parser.parse_control_body(control))
    }

    fn parse_control_body(&mut self, control: Control) -> Result<Node, SyntaxError> {
        let scope = self.vars.len();
        let context = match control {
            Control::If => "if",
            Control::Range => "range",
            Control::With => "with",
        };
        let max_decl = if control == Control::Range { 2 } else { 1 };
        let pipe = self.parse_pipeline(context, true, max_decl)?;
        self.expect(&Token::RightDelim, context)?;

        if control == Control::Range {
            self.range_depth += 1;
        }
        let body_result = self.parse_list();
        if control == Control::Range {
            self.range_depth -= 1;
        }
        let (body, terminator) = body_result?;

        let otherwise = match terminator {
            Terminator::End => Vec::new(),
            Terminator::Else => {
                let chained = match (control, self.peek()) {
                    (Control::If, Some(Token::Keyword(Keyword::If))) => Some(Control::If),
                    (Control::With, Some(Token::Keyword(Keyword::With))) => Some(Control::With),
                    _ => None,
                };
                if let Some(chained) = chained {
                    // `{{else if ...}}` nests a new branch that shares our `{{end}}`.
                    self.pos += 1;
                    vec![self.parse_control(chained)?]
                } else {
                    self.expect(&Token::RightDelim, "else")?;
                    let (otherwise, terminator) = self.parse_list()?;
                    match terminator {
                        Terminator::End => otherwise,
                        Terminator::Else => return Err(self.error("expected end; found {{else}}")),
                        Terminator::Eof => {
                            return Err(self.error(format!("unexpected EOF in {}", context)));
                        }
                    }
                }
            }
            Terminator::Eof => return Err(self.error(format!("unexpected EOF in {}", context))),
        };

        self.vars.truncate(scope);
        let branch = Branch {
            pipe,
            body,
            otherwise,
        };
        Ok(match control {
            Control::If => Node::If(branch),
            Control::Range => Node::Range(branch),
            Control::With => Node::With(branch),
        })
    }

    /// Parses the variable declarations (if any) at the start of a pipeline.
    fn parse_declarations(
        &mut self,
        context: &str,
        max_decl: usize,
    ) -> Result<(Vec<String>, bool), SyntaxError> {
        let var_name = |token: Option<&Token>| match token {
            Some(Token::Variable { name, fields }) if fields.is_empty() => Some(name.clone()),
            _ => None,
        };

        let Some(first) = var_name(self.peek()) else {
            return Ok((Vec::new(), false));
        };
        match self.peek_at(1) {
            Some(Token::Declare) => {
                self.pos += 2;
                Ok((vec![first], false))
            }
            Some(Token::Assign) => {
                if !self.vars.contains(&first) {
                    return Err(self.error(format!("undefined variable \"{}\"", first)));
                }
                self.pos += 2;
                Ok((vec![first], true))
            }
            Some(Token::Comma) if max_decl >= 2 => {
                let second = var_name(self.peek_at(2));
                match (second, self.peek_at(3)) {
                    (Some(second), Some(Token::Declare)) => {
                        self.pos += 4;
                        Ok((vec![first, second], false))
                    }
                    _ => Err(self.error(format!("too many declarations in {}", context))),
                }
            }
            _ => Ok((Vec::new(), false)),
        }
    }

    fn parse_pipeline(
        &mut self,
        context: &str,
        allow_decl: bool,
        max_decl: usize,
    ) -> Result<Pipeline, SyntaxError> {
        let line = self.line();
        let (decl, is_assign) = if allow_decl {
            self.parse_declarations(context, max_decl)?
        } else {
            (Vec::new(), false)
        };

        let mut cmds = Vec::new();
        loop {
            let command = self.parse_command()?;
            if !cmds.is_empty()
                && command.args.first().is_some_and(Operand::is_literal)
            {
                return Err(self.error(format!(
                    "non executable command in pipeline stage {}",
                    cmds.len() + 1
                )));
            }
            cmds.push(command);
            if self.peek() == Some(&Token::Pipe) {
                self.pos += 1;
            } else {
                break;
            }
        }

        if !is_assign {
            self.vars.extend(decl.iter().cloned());
        }
        Ok(Pipeline {
            line,
            decl,
            is_assign,
            cmds,
        })
    }

    fn parse_command(&mut self) -> Result<Command, SyntaxError> {
        let mut args = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unclosed action")),
                Some(Token::RightDelim | Token::RightParen | Token::Pipe) => break,
                Some(_) => {}
            }
            args.push(self.parse_operand()?);
        }
        match args.as_slice() {
            [] => Err(self.error("missing value for command")),
            [Operand::Nil] => Err(self.error("nil is not a command")),
            _ => Ok(Command { args }),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, SyntaxError> {
        let line = self.line();
        let token = self
            .next()
            .ok_or_else(|| self.error("unclosed action"))?;
        let operand = match token {
            Token::Dot => Operand::Dot,
            Token::Field(fields) => Operand::Field(fields),
            Token::Variable { name, fields } => {
                if !self.vars.contains(&name) {
                    return Err(SyntaxError {
                        line,
                        message: format!("undefined variable \"{}\"", name),
                    });
                }
                Operand::Variable { name, fields }
            }
            Token::Identifier(name) => {
                if !(self.is_function)(&name) {
                    return Err(SyntaxError {
                        line,
                        message: format!("function \"{}\" not defined", name),
                    });
                }
                Operand::Function(name)
            }
            Token::Str(s) => Operand::Str(s),
            Token::Number(literal) => parse_number(&literal).ok_or_else(|| SyntaxError {
                line,
                message: format!("bad number syntax: \"{}\"", literal),
            })?,
            Token::Bool(b) => Operand::Bool(b),
            Token::Nil => Operand::Nil,
            Token::LeftParen => {
                let pipe = self.nested(|parser| {
                    let pipe = parser.parse_pipeline("parenthesized pipeline", false, 0)?;
                    parser.expect(&Token::RightParen, "parenthesized pipeline")?;
                    Ok(pipe)
                })?;
                Operand::Pipe(Box::new(pipe))
            }
            other => {
                return Err(SyntaxError {
                    line,
                    message: format!("unexpected {} in operand", describe(&other)),
                });
            }
        };
        Ok(operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::template::lexer::lex;
    use crate::models::Delimiters;

    fn parse_inline(text: &str) -> Result<Vec<Node>, SyntaxError> {
        let tokens = lex(text, &Delimiters::new("[[", "]]"))?;
        parse(&tokens, &|name: &str| matches!(name, "upper" | "printf" | "list"))
    }

    #[test]
    fn test_parses_pipeline_into_commands() {
        let nodes = parse_inline("[[. | upper]]").unwrap();
        let [Node::Action(pipe)] = nodes.as_slice() else {
            panic!("expected a single action, got {:?}", nodes);
        };
        assert_eq!(pipe.cmds.len(), 2);
        assert_eq!(pipe.cmds[0].args, vec![Operand::Dot]);
        assert_eq!(pipe.cmds[1].args, vec![Operand::Function("upper".to_string())]);
    }

    #[test]
    fn test_range_with_else_and_declarations() {
        let nodes = parse_inline("[[range $i, $e := .]][[$i]][[else]]none[[end]]").unwrap();
        let [Node::Range(branch)] = nodes.as_slice() else {
            panic!("expected a range, got {:?}", nodes);
        };
        assert_eq!(branch.pipe.decl, vec!["$i".to_string(), "$e".to_string()]);
        assert_eq!(branch.body.len(), 1);
        assert_eq!(branch.otherwise, vec![Node::Text("none".to_string())]);
    }

    #[test]
    fn test_else_if_chains_share_one_end() {
        let nodes = parse_inline("[[if .]]a[[else if true]]b[[else]]c[[end]]").unwrap();
        let [Node::If(outer)] = nodes.as_slice() else {
            panic!("expected an if, got {:?}", nodes);
        };
        let [Node::If(inner)] = outer.otherwise.as_slice() else {
            panic!("expected a nested if, got {:?}", outer.otherwise);
        };
        assert_eq!(inner.otherwise, vec![Node::Text("c".to_string())]);
    }

    #[test]
    fn test_unknown_function_is_rejected() {
        let err = parse_inline("[[. | shout]]").unwrap_err();
        assert_eq!(err.message, "function \"shout\" not defined");
    }

    #[test]
    fn test_undefined_variable_is_rejected() {
        let err = parse_inline("[[$name]]").unwrap_err();
        assert!(err.message.contains("undefined variable"));
    }

    #[test]
    fn test_variables_go_out_of_scope_after_end() {
        assert!(parse_inline("[[if true]][[$x := 1]][[$x]][[end]]").is_ok());
        assert!(parse_inline("[[if true]][[$x := 1]][[end]][[$x]]").is_err());
    }

    #[test]
    fn test_missing_end_is_rejected() {
        let err = parse_inline("[[range .]]x").unwrap_err();
        assert!(err.message.contains("unexpected EOF"));
    }

    #[test]
    fn test_stray_end_is_rejected() {
        assert!(parse_inline("x[[end]]").is_err());
    }

    #[test]
    fn test_break_outside_range_is_rejected() {
        assert!(parse_inline("[[break]]").is_err());
        assert!(parse_inline("[[range .]][[break]][[end]]").is_ok());
    }

    #[test]
    fn test_literal_cannot_be_a_later_pipeline_stage() {
        let err = parse_inline("[[. | \"x\"]]").unwrap_err();
        assert!(err.message.contains("non executable command"));
    }

    #[test]
    fn test_deep_parentheses_are_rejected() {
        let deep = format!("[[{}1{}]]", "(".repeat(100_000), ")".repeat(100_000));
        let err = parse_inline(&deep).unwrap_err();
        assert_eq!(err.message, "max expression depth exceeded");

        let allowed = MAX_NESTING_DEPTH;
        let ok = format!("[[{}1{}]]", "(".repeat(allowed), ")".repeat(allowed));
        assert!(parse_inline(&ok).is_ok());
    }

    #[test]
    fn test_deep_blocks_are_rejected() {
        let deep = format!("{}x{}", "[[if true]]".repeat(50_000), "[[end]]".repeat(50_000));
        let err = parse_inline(&deep).unwrap_err();
        assert_eq!(err.message, "max expression depth exceeded");

        let chained = format!("[[if .]]{}[[end]]", "[[else if .]]".repeat(50_000));
        assert!(parse_inline(&chained).is_err());
    }

    #[test]
    fn test_number_literals() {
        assert_eq!(parse_number("42"), Some(Operand::Int(42)));
        assert_eq!(parse_number("-0x10"), Some(Operand::Int(-16)));
        assert_eq!(parse_number("1_000"), Some(Operand::Int(1000)));
        assert_eq!(parse_number("2.5"), Some(Operand::Float(2.5)));
        assert_eq!(parse_number("1.2.3"), None);
    }
}
