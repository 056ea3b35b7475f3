//! Placeholder expression language.
//!
//! ```text
//! EXPR   := PATH ('|' FILTER)*
//! FILTER := 'length' | 'default(' ARG ')' | <anything else, ignored>
//! ARG    := 'literal' | "literal" | EXPR
//! ```
//!
//! Expressions are parsed once into an [`Expr`] and evaluated against a
//! render context. Evaluation never mutates the context and borrows from it
//! wherever the result is an unmodified context value.

use std::borrow::Cow;

use hookrelay_core::value::{is_empty_string, length_of, lookup_path};
use hookrelay_core::Value;

/// Returned when nested `default(...)` arguments exceed the depth cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthExceeded;

/// A parsed placeholder expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub path: String,
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Length,
    Default(DefaultArg),
    /// Unrecognized filter, kept for diagnostics and otherwise ignored.
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultArg {
    Literal(String),
    Expr(Box<Expr>),
}

impl Expr {
    /// Parse `source`, allowing at most `max_depth` levels of expression
    /// nesting (the top-level expression counts as one).
    pub fn parse(source: &str, max_depth: usize) -> Result<Self, DepthExceeded> {
        Self::parse_at(source, 1, max_depth)
    }

    fn parse_at(source: &str, depth: usize, max_depth: usize) -> Result<Self, DepthExceeded> {
        if depth > max_depth {
            return Err(DepthExceeded);
        }
        let tokens = split_top_level_pipes(source);
        let mut tokens = tokens.into_iter();
        let path = tokens.next().unwrap_or_default().to_string();
        let filters = tokens
            .map(|token| Filter::parse(token, depth, max_depth))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { path, filters })
    }

    /// Evaluate against `context`. `None` means the expression is unresolved.
    pub fn evaluate<'a>(&self, context: &'a Value) -> Option<Cow<'a, Value>> {
        let mut current = if self.path.is_empty() {
            None
        } else {
            lookup_path(context, &self.path).map(Cow::Borrowed)
        };

        for filter in &self.filters {
            match filter {
                Filter::Length => current = current.map(|v| Cow::Owned(length_of(&v))),
                Filter::Default(arg) => {
                    if matches!(&current, Some(v) if !is_empty_string(v)) {
                        continue;
                    }
                    current = match arg {
                        DefaultArg::Literal(text) => Some(Cow::Owned(Value::String(text.clone()))),
                        DefaultArg::Expr(inner) => inner.evaluate(context),
                    };
                }
                Filter::Unknown(_) => {}
            }
        }

        current
    }
}

impl Filter {
    fn parse(token: &str, depth: usize, max_depth: usize) -> Result<Self, DepthExceeded> {
        if token == "length" {
            return Ok(Self::Length);
        }
        if let Some(arg) = token
            .strip_prefix("default(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let arg = arg.trim();
            return Ok(match unquote(arg) {
                Some(literal) => Self::Default(DefaultArg::Literal(literal.to_string())),
                None => Self::Default(DefaultArg::Expr(Box::new(Expr::parse_at(
                    arg,
                    depth + 1,
                    max_depth,
                )?))),
            });
        }
        Ok(Self::Unknown(token.to_string()))
    }
}

/// Strip matching single or double quotes.
fn unquote(arg: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|quote| {
        (arg.len() >= 2 && arg.starts_with(quote) && arg.ends_with(quote))
            .then(|| &arg[1..arg.len() - 1])
    })
}

/// Split on `|` characters that sit outside parentheses and quotes.
///
/// Tokens are trimmed. A trailing pipe does not produce an empty token.
pub fn split_top_level_pipes(source: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut in_single = false;
    let mut in_double = false;

    for (i, c) in source.char_indices() {
        match c {
            '|' if depth == 0 && !in_single && !in_double => {
                tokens.push(source[start..i].trim());
                start = i + 1;
            }
            '(' if !in_single && !in_double => depth += 1,
            ')' if !in_single && !in_double => depth = depth.saturating_sub(1),
            '\'' if !in_double => in_single = !in_single,
            '"' if !in_single => in_double = !in_double,
            _ => {}
        }
    }
    if start < source.len() {
        tokens.push(source[start..].trim());
    }
    tokens
}
