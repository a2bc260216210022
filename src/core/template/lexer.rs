// src/core/template/lexer.rs

//! Splits a template body into text runs and action tokens.
//!
//! The delimiters are configurable, so the same lexer handles `{{ }}` file templates and
//! `[[ ]]` inline templates. Trim markers (`{{- ` and ` -}}`) are applied here: they strip
//! the adjacent whitespace from the neighbouring text token, so the parser never sees them.

use super::SyntaxError;
use crate::models::Delimiters;

/// Reserved words that open, continue or close control structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    If,
    Else,
    End,
    Range,
    With,
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Text(String),
    LeftDelim,
    RightDelim,
    Keyword(Keyword),
    /// A function name.
    Identifier(String),
    /// `.a.b` relative to dot, stored without the leading dots.
    Field(Vec<String>),
    Dot,
    /// `$` or `$name`, with an optional `.a.b` chain.
    Variable { name: String, fields: Vec<String> },
    Str(String),
    /// A numeric literal, validated by the parser.
    Number(String),
    Bool(bool),
    Nil,
    Pipe,
    LeftParen,
    RightParen,
    Declare,
    Assign,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) line: usize,
}

const COMMENT_OPEN: &str = "/*";
const COMMENT_CLOSE: &str = "*/";

struct Lexer<'a> {
    input: &'a str,
    delims: &'a Delimiters,
    pos: usize,
    line: usize,
    tokens: Vec<Spanned>,
    trim_next_text: bool,
}

/// Tokenizes `input` using the given delimiters.
pub(crate) fn lex(input: &str, delims: &Delimiters) -> Result<Vec<Spanned>, SyntaxError> {
    let mut lexer = Lexer {
        input,
        delims,
        pos: 0,
        line: 1,
        tokens: Vec::new(),
        trim_next_text: false,
    };
    lexer.run()?;
    log::trace!("Lexed {} tokens", lexer.tokens.len());
    Ok(lexer.tokens)
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_alphanumeric(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

impl<'a> Lexer<'a> {
    fn rest(&self) -> &'a str {
        self.input.get(self.pos..).unwrap_or_default()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn push(&mut self, token: Token) {
        self.tokens.push(Spanned {
            token,
            line: self.line,
        });
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line: self.line,
            message: message.into(),
        }
    }

    fn run(&mut self) -> Result<(), SyntaxError> {
        loop {
            let rest = self.rest();
            let text_len = rest.find(self.delims.left.as_str()).unwrap_or(rest.len());
            let raw_text = rest.get(..text_len).unwrap_or_default();
            let after_delim = rest
                .get(text_len + self.delims.left.len()..)
                .unwrap_or_default();
            let found_delim = text_len < rest.len();

            let trim_left = found_delim && has_left_trim_marker(after_delim);
            let mut text = raw_text;
            if std::mem::take(&mut self.trim_next_text) {
                text = text.trim_start_matches(is_space);
            }
            if trim_left {
                text = text.trim_end_matches(is_space);
            }
            if !text.is_empty() {
                let token = Token::Text(text.to_string());
                self.push(token);
            }
            self.line += raw_text.matches('\n').count();
            self.pos += text_len;

            if !found_delim {
                return Ok(());
            }
            self.pos += self.delims.left.len();
            if trim_left {
                self.pos += 2;
            }
            self.lex_action()?;
        }
    }

    /// Lexes everything between an opening delimiter and its closing delimiter.
    fn lex_action(&mut self) -> Result<(), SyntaxError> {
        if self.rest().starts_with(COMMENT_OPEN) {
            return self.lex_comment();
        }
        self.push(Token::LeftDelim);
        let mut paren_depth = 0usize;

        loop {
            if self.rest().starts_with(self.delims.right.as_str()) {
                if paren_depth > 0 {
                    return Err(self.error("unclosed left paren"));
                }
                self.pos += self.delims.right.len();
                self.push(Token::RightDelim);
                return Ok(());
            }
            if self.at_right_trim_marker() {
                if paren_depth > 0 {
                    return Err(self.error("unclosed left paren"));
                }
                self.pos += 2 + self.delims.right.len();
                self.push(Token::RightDelim);
                self.trim_next_text = true;
                return Ok(());
            }

            let Some(c) = self.peek() else {
                return Err(self.error("unclosed action"));
            };
            match c {
                c if is_space(c) => {
                    self.bump();
                }
                '|' => {
                    self.bump();
                    self.push(Token::Pipe);
                }
                '(' => {
                    self.bump();
                    paren_depth += 1;
                    self.push(Token::LeftParen);
                }
                ')' => {
                    self.bump();
                    paren_depth = paren_depth
                        .checked_sub(1)
                        .ok_or_else(|| self.error("unexpected right paren"))?;
                    self.push(Token::RightParen);
                }
                ',' => {
                    self.bump();
                    self.push(Token::Comma);
                }
                ':' => {
                    self.bump();
                    if self.peek() != Some('=') {
                        return Err(self.error("expected :="));
                    }
                    self.bump();
                    self.push(Token::Declare);
                }
                '=' => {
                    self.bump();
                    self.push(Token::Assign);
                }
                '"' => self.lex_quoted()?,
                '`' => self.lex_raw_string()?,
                '\'' => self.lex_char()?,
                '$' => {
                    self.bump();
                    let name = format!("${}", self.take_while(is_alphanumeric));
                    let fields = self.lex_field_chain();
                    self.push(Token::Variable { name, fields });
                }
                '.' => {
                    if self.peek_second().is_some_and(|n| n.is_ascii_digit()) {
                        self.lex_number();
                    } else {
                        let fields = self.lex_field_chain();
                        if fields.is_empty() {
                            self.bump();
                            self.push(Token::Dot);
                        } else {
                            self.push(Token::Field(fields));
                        }
                    }
                }
                '+' | '-' if self.peek_second().is_some_and(|n| n.is_ascii_digit() || n == '.') => {
                    self.lex_number();
                }
                c if c.is_ascii_digit() => {
                    self.lex_number();
                }
                c if is_alphanumeric(c) => {
                    let word = self.take_while(is_alphanumeric);
                    let token = match word.as_str() {
                        "if" => Token::Keyword(Keyword::If),
                        "else" => Token::Keyword(Keyword::Else),
                        "end" => Token::Keyword(Keyword::End),
                        "range" => Token::Keyword(Keyword::Range),
                        "with" => Token::Keyword(Keyword::With),
                        "break" => Token::Keyword(Keyword::Break),
                        "continue" => Token::Keyword(Keyword::Continue),
                        "true" => Token::Bool(true),
                        "false" => Token::Bool(false),
                        "nil" => Token::Nil,
                        _ => Token::Identifier(word),
                    };
                    self.push(token);
                }
                other => {
                    return Err(self.error(format!("unexpected {:?} in command", other)));
                }
            }
        }
    }

    fn lex_comment(&mut self) -> Result<(), SyntaxError> {
        let start_line = self.line;
        let Some(end) = self.rest().find(COMMENT_CLOSE) else {
            return Err(SyntaxError {
                line: start_line,
                message: "unclosed comment".to_string(),
            });
        };
        let comment = self.rest().get(..end).unwrap_or_default();
        self.line += comment.matches('\n').count();
        self.pos += end + COMMENT_CLOSE.len();

        if self.rest().starts_with(self.delims.right.as_str()) {
            self.pos += self.delims.right.len();
            Ok(())
        } else if self.at_right_trim_marker() {
            self.pos += 2 + self.delims.right.len();
            self.trim_next_text = true;
            Ok(())
        } else {
            Err(self.error("comment ends before closing delimiter"))
        }
    }

    /// A right trim marker is one space followed by `-` immediately before the delimiter.
    fn at_right_trim_marker(&self) -> bool {
        let mut chars = self.rest().chars();
        matches!(chars.next(), Some(c) if is_space(c))
            && chars.next() == Some('-')
            && self
                .rest()
                .get(2..)
                .is_some_and(|r| r.starts_with(self.delims.right.as_str()))
    }

    fn take_while(&mut self, pred: fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    /// Consumes `.name.name...` directly following the current position.
    fn lex_field_chain(&mut self) -> Vec<String> {
        let mut fields = Vec::new();
        while self.peek() == Some('.') && self.peek_second().is_some_and(is_alphanumeric) {
            self.bump();
            fields.push(self.take_while(is_alphanumeric));
        }
        fields
    }

    fn lex_number(&mut self) {
        let mut literal = String::new();
        if let Some(sign @ ('+' | '-')) = self.peek() {
            literal.push(sign);
            self.bump();
        }
        let mut prev = ' ';
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '+' | '-') && matches!(prev, 'e' | 'E' | 'p' | 'P');
            if !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign) {
                break;
            }
            literal.push(c);
            prev = c;
            self.bump();
        }
        self.push(Token::Number(literal));
    }

    fn lex_quoted(&mut self) -> Result<(), SyntaxError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("unterminated quoted string")),
                Some('"') => break,
                Some('\\') => {
                    let escaped = self.lex_escape()?;
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
        self.push(Token::Str(out));
        Ok(())
    }

    /// The character after a backslash in a quoted string or character constant.
    ///
    /// `\xNN` yields the code point U+00NN: strings hold UTF-8 text, not arbitrary bytes.
    fn lex_escape(&mut self) -> Result<char, SyntaxError> {
        Ok(match self.bump() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some('a') => '\u{07}',
            Some('b') => '\u{08}',
            Some('f') => '\u{0c}',
            Some('v') => '\u{0b}',
            Some('\\') => '\\',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('u') => self.lex_unicode_escape(4)?,
            Some('U') => self.lex_unicode_escape(8)?,
            Some('x') => self.lex_unicode_escape(2)?,
            Some(other) => {
                return Err(self.error(format!("unknown escape sequence: \\{}", other)));
            }
            None => return Err(self.error("unterminated quoted string")),
        })
    }

    /// A character constant such as `'a'` or `'\n'`, which evaluates to its code point.
    fn lex_char(&mut self) -> Result<(), SyntaxError> {
        self.bump();
        let c = match self.bump() {
            None | Some('\n') => return Err(self.error("unterminated character constant")),
            Some('\'') => return Err(self.error("empty character constant")),
            Some('\\') => self.lex_escape()?,
            Some(c) => c,
        };
        if self.bump() != Some('\'') {
            return Err(self.error("malformed character constant"));
        }
        self.push(Token::Number(u32::from(c).to_string()));
        Ok(())
    }

    fn lex_unicode_escape(&mut self, digits: usize) -> Result<char, SyntaxError> {
        let mut hex = String::with_capacity(digits);
        for _ in 0..digits {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                _ => return Err(self.error("invalid escape sequence in quoted string")),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("invalid escape sequence in quoted string"))
    }

    fn lex_raw_string(&mut self) -> Result<(), SyntaxError> {
        let start_line = self.line;
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(SyntaxError {
                        line: start_line,
                        message: "unterminated raw quoted string".to_string(),
                    });
                }
                Some('`') => break,
                Some(c) => out.push(c),
            }
        }
        self.push(Token::Str(out));
        Ok(())
    }
}

/// A left trim marker is `-` followed by whitespace immediately after the delimiter.
fn has_left_trim_marker(after_delim: &str) -> bool {
    let mut chars = after_delim.chars();
    chars.next() == Some('-') && chars.next().is_some_and(is_space)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        lex(input, &Delimiters::new("[[", "]]"))
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_text_and_dot() {
        assert_eq!(
            kinds("Hello [[.]]!"),
            vec![
                Token::Text("Hello ".to_string()),
                Token::LeftDelim,
                Token::Dot,
                Token::RightDelim,
                Token::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_pipeline_with_function_and_string() {
        assert_eq!(
            kinds(r#"[[.|printf "%s\n"]]"#),
            vec![
                Token::LeftDelim,
                Token::Dot,
                Token::Pipe,
                Token::Identifier("printf".to_string()),
                Token::Str("%s\n".to_string()),
                Token::RightDelim,
            ]
        );
    }

    #[test]
    fn test_double_braces_are_plain_text_for_inline_delimiters() {
        assert_eq!(
            kinds("{{.}} [[.]]"),
            vec![
                Token::Text("{{.}} ".to_string()),
                Token::LeftDelim,
                Token::Dot,
                Token::RightDelim,
            ]
        );
    }

    #[test]
    fn test_trim_markers_strip_adjacent_whitespace() {
        assert_eq!(
            kinds("a  \n [[- . -]] \n b"),
            vec![
                Token::Text("a".to_string()),
                Token::LeftDelim,
                Token::Dot,
                Token::RightDelim,
                Token::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_negative_number_is_not_a_trim_marker() {
        assert_eq!(
            kinds("[[add 1 -2]]"),
            vec![
                Token::LeftDelim,
                Token::Identifier("add".to_string()),
                Token::Number("1".to_string()),
                Token::Number("-2".to_string()),
                Token::RightDelim,
            ]
        );
    }

    #[test]
    fn test_character_constants_are_code_points() {
        assert_eq!(
            kinds(r"[[print 'a' '\n' 'é']]"),
            vec![
                Token::LeftDelim,
                Token::Identifier("print".to_string()),
                Token::Number("97".to_string()),
                Token::Number("10".to_string()),
                Token::Number("233".to_string()),
                Token::RightDelim,
            ]
        );
        let delims = Delimiters::new("[[", "]]");
        assert!(lex("[['']]", &delims).is_err());
        assert!(lex("[['ab']]", &delims).is_err());
    }

    #[test]
    fn test_comments_produce_no_tokens() {
        assert_eq!(
            kinds("a[[/* note */]]b"),
            vec![Token::Text("a".to_string()), Token::Text("b".to_string())]
        );
    }

    #[test]
    fn test_variables_fields_and_declarations() {
        assert_eq!(
            kinds("[[$x := .user.name]]"),
            vec![
                Token::LeftDelim,
                Token::Variable {
                    name: "$x".to_string(),
                    fields: vec![],
                },
                Token::Declare,
                Token::Field(vec!["user".to_string(), "name".to_string()]),
                Token::RightDelim,
            ]
        );
    }

    #[test]
    fn test_right_delimiter_inside_string_is_literal() {
        assert_eq!(
            kinds(r#"[["]]"]]"#),
            vec![
                Token::LeftDelim,
                Token::Str("]]".to_string()),
                Token::RightDelim,
            ]
        );
    }

    #[test]
    fn test_unclosed_action_is_an_error() {
        let err = lex("Hello [[ .", &Delimiters::new("[[", "]]")).unwrap_err();
        assert!(err.message.contains("unclosed action"));
    }

    #[test]
    fn test_line_numbers_are_tracked() {
        let tokens = lex("a\nb\n{{ . }}", &Delimiters::new("{{", "}}")).unwrap();
        let dot = tokens.iter().find(|s| s.token == Token::Dot).unwrap();
        assert_eq!(dot.line, 3);
    }
}
