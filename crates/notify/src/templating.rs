//! Placeholder rendering for notification templates.
//!
//! Templates are arbitrary JSON-shaped documents. Every string leaf is
//! rendered in two passes: `{{#if EXPR}} ... {{/if}}` blocks first, then
//! inline `{{ EXPR }}` placeholders. Map keys are never rendered. Text
//! substituted from the context is not scanned again.

use hookrelay_core::config::{EngineConfig, DEFAULT_MAX_RENDER_DEPTH};
use hookrelay_core::value::{is_truthy, stringify};
use hookrelay_core::Value;
use serde::Serialize;

use crate::expr::Expr;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A rendered document plus the placeholders that could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendered {
    pub document: Value,
    /// Expression text of each placeholder left verbatim, in encounter order.
    pub unresolved: Vec<String>,
}

/// Renders template documents against a context value.
#[derive(Debug, Clone)]
pub struct ExpressionRenderer {
    max_depth: usize,
}

impl ExpressionRenderer {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.max_render_depth)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Render a fresh copy of `template`. The template is never modified.
    pub fn render(&self, template: &Value, context: &Value) -> Value {
        self.render_with_diagnostics(template, context).document
    }

    /// Like [`render`](Self::render), also reporting unresolved placeholders.
    pub fn render_with_diagnostics(&self, template: &Value, context: &Value) -> Rendered {
        let mut unresolved = Vec::new();
        let document = self.render_value(template, context, &mut unresolved);
        if !unresolved.is_empty() {
            tracing::debug!(count = unresolved.len(), ?unresolved, "placeholders left unresolved");
        }
        Rendered {
            document,
            unresolved,
        }
    }

    /// Render a single string.
    pub fn render_str(&self, text: &str, context: &Value) -> String {
        let mut unresolved = Vec::new();
        self.render_text(text, context, 1, &mut unresolved)
    }

    fn render_value(&self, value: &Value, context: &Value, unresolved: &mut Vec<String>) -> Value {
        match value {
            Value::String(text) => Value::String(self.render_text(text, context, 1, unresolved)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.render_value(item, context, unresolved))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.render_value(item, context, unresolved)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Resolve conditional blocks, rendering the text around them inline.
    fn render_text(
        &self,
        text: &str,
        context: &Value,
        depth: usize,
        unresolved: &mut Vec<String>,
    ) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(block) = find_if_block(rest) {
            self.render_inline(&rest[..block.start], context, &mut out, unresolved);

            if depth > self.max_depth {
                tracing::debug!(depth, max_depth = self.max_depth, "conditional nesting too deep, dropping block");
            } else if self.condition_holds(block.condition, context) {
                let body = &rest[block.body_start..block.body_end];
                out.push_str(&self.render_text(body, context, depth + 1, unresolved));
            }

            rest = &rest[block.end..];
        }

        self.render_inline(rest, context, &mut out, unresolved);
        out
    }

    fn condition_holds(&self, condition: &str, context: &Value) -> bool {
        match Expr::parse(condition, self.max_depth) {
            Ok(expr) => is_truthy(expr.evaluate(context).as_deref()),
            Err(_) => false,
        }
    }

    /// Replace every single-line `{{ EXPR }}` in `text`, appending to `out`.
    fn render_inline(
        &self,
        text: &str,
        context: &Value,
        out: &mut String,
        unresolved: &mut Vec<String>,
    ) {
        let mut rest = text;
        while let Some(open) = rest.find(OPEN) {
            let inner_start = open + OPEN.len();
            let Some(close) = rest[inner_start..].find(CLOSE).map(|i| inner_start + i) else {
                break;
            };
            let source = rest[inner_start..close].trim();

            if source.is_empty() || source.contains('\n') {
                // Not a placeholder here; retry from the next character.
                let next = open + 1;
                out.push_str(&rest[..next]);
                rest = &rest[next..];
                continue;
            }

            out.push_str(&rest[..open]);
            let end = close + CLOSE.len();
            let resolved = Expr::parse(source, self.max_depth)
                .ok()
                .and_then(|expr| expr.evaluate(context).map(|v| stringify(&v).into_owned()));
            match resolved {
                Some(text) => out.push_str(&text),
                None => {
                    out.push_str(&rest[open..end]);
                    unresolved.push(source.to_string());
                }
            }
            rest = &rest[end..];
        }
        out.push_str(rest);
    }
}

impl Default for ExpressionRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RENDER_DEPTH)
    }
}

/// Byte offsets of one `{{#if COND}} BODY {{/if}}` block.
struct IfBlock<'a> {
    start: usize,
    condition: &'a str,
    body_start: usize,
    body_end: usize,
    end: usize,
}

/// Find the leftmost complete conditional block. The opening tag pairs with
/// its matching closing tag, so inner blocks stay inside the body.
fn find_if_block(text: &str) -> Option<IfBlock<'_>> {
    let mut from = 0;
    while let Some(offset) = text[from..].find(OPEN) {
        let start = from + offset;
        if let Some((condition, body_start)) = parse_if_open(text, start) {
            let Some((body_end, end)) = find_if_close(text, body_start) else {
                // Unclosed opener; a later one may still be complete.
                from = start + 1;
                continue;
            };
            return Some(IfBlock {
                start,
                condition,
                body_start,
                body_end,
                end,
            });
        }
        from = start + 1;
    }
    None
}

/// Parse `{{ #if COND }}` at `start`, returning the trimmed condition and
/// the offset just past the tag.
fn parse_if_open(text: &str, start: usize) -> Option<(&str, usize)> {
    let after = skip_ws(text, start + OPEN.len());
    let after_kw = text.len() - text[after..].strip_prefix("#if")?.len();
    let cond_start = skip_ws(text, after_kw);
    if cond_start == after_kw {
        return None;
    }
    let cond_end = cond_start + text[cond_start..].find(CLOSE)?;
    let condition = text[cond_start..cond_end].trim();
    if condition.is_empty() {
        return None;
    }
    Some((condition, cond_end + CLOSE.len()))
}

/// Parse `{{ /if }}` at `start`, returning the offset just past the tag.
fn parse_if_close(text: &str, start: usize) -> Option<usize> {
    let pos = skip_ws(text, start + OPEN.len());
    let kw_end = text.len() - text[pos..].strip_prefix("/if")?.len();
    let close = skip_ws(text, kw_end);
    text[close..].starts_with(CLOSE).then(|| close + CLOSE.len())
}

/// Find the `{{ /if }}` that closes a block whose body starts at `from`,
/// skipping over nested open/close pairs: returns (tag start, tag end).
fn find_if_close(text: &str, from: usize) -> Option<(usize, usize)> {
    let mut nested = 0usize;
    let mut search = from;
    while let Some(offset) = text[search..].find(OPEN) {
        let start = search + offset;
        if let Some((_, after)) = parse_if_open(text, start) {
            nested += 1;
            search = after;
        } else if let Some(end) = parse_if_close(text, start) {
            if nested == 0 {
                return Some((start, end));
            }
            nested -= 1;
            search = end;
        } else {
            search = start + 1;
        }
    }
    None
}

fn skip_ws(text: &str, from: usize) -> usize {
    text[from..]
        .find(|c: char| !c.is_ascii_whitespace())
        .map_or(text.len(), |i| from + i)
}
