// src/core/template/exec.rs

use super::TemplateError;
use super::funcs::FUNCS;
use super::parser::{Branch, Command, Node, Operand, Pipeline};
use super::value::Value;
use std::fmt::Write;

/// Functions whose first argument, a map, is updated in place.
const MUTATING_FUNCS: [&str; 6] = [
    "set",
    "unset",
    "merge",
    "mergeOverwrite",
    "mustMerge",
    "mustMergeOverwrite",
];

/// What a list of nodes asks the enclosing `range` to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
}

/// Walks a parsed template and renders it into a string.
pub(crate) struct Executor<'a> {
    name: &'a str,
    root: Option<Value>,
    dot: Option<Value>,
    vars: Vec<(String, Value)>,
    out: String,
}

impl<'a> Executor<'a> {
    /// `data` of `None` means nothing was bound: reading `.` or `$` is an error.
    pub(crate) fn new(name: &'a str, data: Option<Value>) -> Self {
        Self {
            name,
            dot: data.clone(),
            root: data,
            vars: Vec::new(),
            out: String::new(),
        }
    }

    /// Renders `nodes`, returning the complete output.
    pub(crate) fn run(mut self, nodes: &[Node]) -> Result<String, TemplateError> {
        self.walk(nodes)?;
        Ok(self.out)
    }

    fn failed(&self, line: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::Execution {
            name: self.name.to_string(),
            line,
            message: message.into(),
        }
    }

    fn undefined(&self, line: usize, what: &str) -> TemplateError {
        TemplateError::UndefinedReference {
            name: self.name.to_string(),
            line,
            what: what.to_string(),
        }
    }

    fn walk(&mut self, nodes: &[Node]) -> Result<Flow, TemplateError> {
        for node in nodes {
            let flow = match node {
                Node::Text(text) => {
                    self.out.push_str(text);
                    Flow::Normal
                }
                Node::Action(pipe) => {
                    let value = self.eval_pipeline(pipe, true)?;
                    if pipe.decl.is_empty() {
                        self.print(&value);
                    }
                    Flow::Normal
                }
                Node::If(branch) => self.walk_if(branch)?,
                Node::With(branch) => self.walk_with(branch)?,
                Node::Range(branch) => self.walk_range(branch)?,
                Node::Break(_) => Flow::Break,
                Node::Continue(_) => Flow::Continue,
            };
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn print(&mut self, value: &Value) {
        match value {
            Value::Nil => self.out.push_str("<no value>"),
            other => {
                let _ = write!(self.out, "{}", other);
            }
        }
    }

    fn walk_if(&mut self, branch: &Branch) -> Result<Flow, TemplateError> {
        let mark = self.vars.len();
        let condition = self.eval_pipeline(&branch.pipe, true)?;
        let flow = if condition.is_truthy() {
            self.walk(&branch.body)
        } else {
            self.walk(&branch.otherwise)
        };
        self.vars.truncate(mark);
        flow
    }

    fn walk_with(&mut self, branch: &Branch) -> Result<Flow, TemplateError> {
        let mark = self.vars.len();
        let value = self.eval_pipeline(&branch.pipe, true)?;
        let flow = if value.is_truthy() {
            let saved = self.dot.replace(value);
            let flow = self.walk(&branch.body);
            self.dot = saved;
            flow
        } else {
            self.walk(&branch.otherwise)
        };
        self.vars.truncate(mark);
        flow
    }

    fn walk_range(&mut self, branch: &Branch) -> Result<Flow, TemplateError> {
        let line = branch.pipe.line;
        let value = self.eval_pipeline(&branch.pipe, false)?;
        let items: Vec<(Value, Value)> = match value {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (Value::Int(i64::try_from(i).unwrap_or(i64::MAX)), v))
                .collect(),
            Value::Map(map) => map.into_iter().map(|(k, v)| (Value::Str(k), v)).collect(),
            Value::Int(n) => {
                if branch.pipe.decl.len() > 1 {
                    return Err(self.failed(
                        line,
                        "can't use two iteration variables when ranging over an integer",
                    ));
                }
                (0..n.max(0)).map(|i| (Value::Int(i), Value::Int(i))).collect()
            }
            Value::Nil => Vec::new(),
            other => {
                return Err(self.failed(
                    line,
                    format!("range can't iterate over {}", other),
                ));
            }
        };

        if items.is_empty() {
            return self.walk(&branch.otherwise);
        }

        let mark = self.vars.len();
        let saved = self.dot.clone();
        let mut result = Ok(Flow::Normal);
        for (key, element) in items {
            match branch.pipe.decl.as_slice() {
                [elem] => self.vars.push((elem.clone(), element.clone())),
                [index, elem] => {
                    self.vars.push((index.clone(), key));
                    self.vars.push((elem.clone(), element.clone()));
                }
                _ => {}
            }
            self.dot = Some(element);
            let flow = self.walk(&branch.body);
            self.vars.truncate(mark);
            match flow {
                Ok(Flow::Break) => break,
                Ok(Flow::Normal | Flow::Continue) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.dot = saved;
        result
    }

    fn eval_pipeline(&mut self, pipe: &Pipeline, declare: bool) -> Result<Value, TemplateError> {
        let mut value: Option<Value> = None;
        for cmd in &pipe.cmds {
            value = Some(self.eval_command(pipe.line, cmd, value)?);
        }
        let value = value.unwrap_or(Value::Nil);

        if declare {
            if pipe.is_assign {
                for name in &pipe.decl {
                    let slot = self.vars.iter_mut().rev().find(|(n, _)| n == name);
                    match slot {
                        Some(slot) => slot.1 = value.clone(),
                        None => {
                            return Err(self.failed(
                                pipe.line,
                                format!("undefined variable: {}", name),
                            ));
                        }
                    }
                }
            } else {
                for name in &pipe.decl {
                    self.vars.push((name.clone(), value.clone()));
                }
            }
        }
        Ok(value)
    }

    fn eval_command(
        &mut self,
        line: usize,
        cmd: &Command,
        piped: Option<Value>,
    ) -> Result<Value, TemplateError> {
        let Some((head, rest)) = cmd.args.split_first() else {
            return Err(self.failed(line, "empty command"));
        };

        let Operand::Function(name) = head else {
            if !rest.is_empty() || piped.is_some() {
                return Err(self.failed(
                    line,
                    format!("can't give argument to non-function {}", describe(head)),
                ));
            }
            return self.eval_operand(line, head);
        };

        if name == "and" || name == "or" {
            return self.eval_short_circuit(line, name == "and", rest, piped);
        }

        let def = FUNCS
            .get(name.as_str())
            .ok_or_else(|| self.failed(line, format!("function \"{}\" not defined", name)))?;

        let mut args = Vec::with_capacity(rest.len() + 1);
        for operand in rest {
            args.push(self.eval_operand(line, operand)?);
        }
        args.extend(piped);

        let count = args.len();
        if count < def.min_args || def.max_args.is_some_and(|max| count > max) {
            let want = match def.max_args {
                Some(max) if max == def.min_args => format!("{}", max),
                Some(max) => format!("{} to {}", def.min_args, max),
                None => format!("at least {}", def.min_args),
            };
            return Err(self.failed(
                line,
                format!("wrong number of args for {}: want {} got {}", name, want, count),
            ));
        }

        let result = (def.call)(&args)
            .map_err(|message| self.failed(line, format!("error calling {}: {}", name, message)))?;
        if MUTATING_FUNCS.contains(&name.as_str()) {
            if let Some(target) = rest.first() {
                self.store(target, &result);
            }
        }
        Ok(result)
    }

    /// Writes a map updated by `set`, `unset` or `merge` back into the variable (or dot) it
    /// came from, so `[[ $_ := set $m "k" 1 ]]` changes `$m` itself.
    fn store(&mut self, target: &Operand, value: &Value) {
        let slot = match target {
            Operand::Dot => self.dot.as_mut(),
            Operand::Variable { name, fields } if fields.is_empty() => {
                if name == "$" {
                    self.root.as_mut()
                } else {
                    self.vars
                        .iter_mut()
                        .rev()
                        .find(|(n, _)| n == name)
                        .map(|(_, v)| v)
                }
            }
            _ => None,
        };
        if let Some(slot) = slot {
            if matches!(slot, Value::Map(_)) {
                *slot = value.clone();
            }
        }
    }

    /// `and` and `or` stop evaluating their arguments once the result is known.
    fn eval_short_circuit(
        &mut self,
        line: usize,
        is_and: bool,
        operands: &[Operand],
        piped: Option<Value>,
    ) -> Result<Value, TemplateError> {
        if operands.is_empty() && piped.is_none() {
            let name = if is_and { "and" } else { "or" };
            return Err(self.failed(
                line,
                format!("wrong number of args for {}: want at least 1 got 0", name),
            ));
        }
        let mut last = Value::Nil;
        for operand in operands {
            last = self.eval_operand(line, operand)?;
            if last.is_truthy() != is_and {
                return Ok(last);
            }
        }
        if let Some(value) = piped {
            last = value;
        }
        Ok(last)
    }

    fn eval_operand(&mut self, line: usize, operand: &Operand) -> Result<Value, TemplateError> {
        match operand {
            Operand::Dot => self.dot.clone().ok_or_else(|| self.undefined(line, ".")),
            Operand::Field(fields) => {
                let dot = self.dot.as_ref().ok_or_else(|| self.undefined(line, "."))?;
                self.walk_fields(line, dot, fields)
            }
            Operand::Variable { name, fields } => {
                let value = if name == "$" {
                    self.root.as_ref().ok_or_else(|| self.undefined(line, "$"))?
                } else {
                    self.vars
                        .iter()
                        .rev()
                        .find(|(n, _)| n == name)
                        .map(|(_, v)| v)
                        .ok_or_else(|| self.failed(line, format!("undefined variable: {}", name)))?
                };
                self.walk_fields(line, value, fields)
            }
            Operand::Function(name) => self.eval_command(
                line,
                &Command {
                    args: vec![Operand::Function(name.clone())],
                },
                None,
            ),
            Operand::Str(s) => Ok(Value::Str(s.clone())),
            Operand::Int(i) => Ok(Value::Int(*i)),
            Operand::Float(f) => Ok(Value::Float(*f)),
            Operand::Bool(b) => Ok(Value::Bool(*b)),
            Operand::Nil => Ok(Value::Nil),
            Operand::Pipe(pipe) => self.eval_pipeline(pipe, false),
        }
    }

    fn walk_fields(
        &self,
        line: usize,
        start: &Value,
        fields: &[String],
    ) -> Result<Value, TemplateError> {
        let mut current = start;
        for field in fields {
            current = match current {
                Value::Map(map) => match map.get(field) {
                    Some(value) => value,
                    None => return Ok(Value::Nil),
                },
                Value::Nil => {
                    return Err(self.failed(
                        line,
                        format!("nil pointer evaluating interface {{}}.{}", field),
                    ));
                }
                other => {
                    return Err(self.failed(
                        line,
                        format!("can't evaluate field {} in type {}", field, other.type_name()),
                    ));
                }
            };
        }
        Ok(current.clone())
    }
}

fn describe(operand: &Operand) -> String {
    match operand {
        Operand::Dot => ".".to_string(),
        Operand::Field(fields) => format!(".{}", fields.join(".")),
        Operand::Variable { name, fields } if fields.is_empty() => name.clone(),
        Operand::Variable { name, fields } => format!("{}.{}", name, fields.join(".")),
        Operand::Function(name) => name.clone(),
        Operand::Str(s) => format!("{:?}", s),
        Operand::Int(i) => i.to_string(),
        Operand::Float(f) => f.to_string(),
        Operand::Bool(b) => b.to_string(),
        Operand::Nil => "nil".to_string(),
        Operand::Pipe(_) => "(...)".to_string(),
    }
}
