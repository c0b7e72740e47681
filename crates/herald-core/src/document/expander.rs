//! Special-node expansion: conditional pruning and iteration unrolling.
//!
//! The input tree is cloned into an [`Arena`] and walked breadth-first from
//! a FIFO worklist. Visiting a slot classifies each of its pending children:
//!
//! - a conditional whose guard does not render to `true` is dropped along
//!   with its subtree, which is never visited;
//! - a passing conditional loses its guard and is queued like any node;
//! - an iteration is replaced by one indexed copy of its content per element
//!   of the source array; the copies are classified in turn, so nested
//!   guards and iterations inside them are handled by the same loop.
//!
//! Children lists are only ever replaced wholesale.

use std::collections::VecDeque;

use herald_types::context::DataContext;
use herald_types::document::{DocumentNode, EACH_KEY, NodeRole, SHOW_IF_KEY};
use serde_json::Value;

use super::ExpandError;
use super::arena::Arena;
use super::references::index_subtree;
use crate::path;
use crate::template::TemplateEngine;

/// Counters describing one expansion, for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionStats {
    pub pruned: usize,
    pub iterations: usize,
    pub copies: usize,
}

/// Run the special-node pass over a clone of `root`.
pub fn expand_special_nodes(
    root: &DocumentNode,
    context: &DataContext,
    guards: &TemplateEngine,
) -> Result<(DocumentNode, ExpansionStats), ExpandError> {
    let data = context.to_value();
    let mut stats = ExpansionStats::default();
    let mut root = root.clone();

    match root.role() {
        NodeRole::Conflicting => {
            return Err(ExpandError::ConflictingControls {
                kind: root.kind.to_string(),
            });
        }
        NodeRole::Conditional(guard) => {
            if guard_passes(guard, &data, guards)? {
                root.attrs.remove(SHOW_IF_KEY);
            } else {
                stats.pruned += 1;
                root.content.clear();
                root.attrs.remove(SHOW_IF_KEY);
            }
        }
        NodeRole::Iteration(each) => {
            let each = each.to_string();
            let copies = unroll(&root, &each, &data)?;
            stats.iterations += 1;
            stats.copies += copies.len();
            root.attrs.remove(EACH_KEY);
            root.content = copies;
        }
        NodeRole::Plain => {}
    }

    let mut arena = Arena::new();
    let root_id = arena.push(root);
    let mut worklist = VecDeque::from([root_id]);

    while let Some(id) = worklist.pop_front() {
        let mut pending: VecDeque<DocumentNode> = arena.take_pending(id).into();
        let mut children = Vec::with_capacity(pending.len());

        while let Some(mut child) = pending.pop_front() {
            match child.role() {
                NodeRole::Conflicting => {
                    return Err(ExpandError::ConflictingControls {
                        kind: child.kind.to_string(),
                    });
                }
                NodeRole::Conditional(guard) => {
                    if !guard_passes(guard, &data, guards)? {
                        stats.pruned += 1;
                        continue;
                    }
                    child.attrs.remove(SHOW_IF_KEY);
                }
                NodeRole::Iteration(each) => {
                    let each = each.to_string();
                    let copies = unroll(&child, &each, &data)?;
                    stats.iterations += 1;
                    stats.copies += copies.len();
                    for copy in copies.into_iter().rev() {
                        pending.push_front(copy);
                    }
                    continue;
                }
                NodeRole::Plain => {}
            }
            let child_id = arena.push(child);
            children.push(child_id);
            worklist.push_back(child_id);
        }
        arena.set_children(id, children);
    }

    Ok((arena.into_tree(root_id), stats))
}

/// Render a guard and compare it with `true`, ignoring case and whitespace.
/// A bare path is wrapped in a placeholder first.
pub fn guard_passes(guard: &str, data: &Value, engine: &TemplateEngine) -> Result<bool, ExpandError> {
    let template = if guard.contains("{{") {
        guard.to_string()
    } else {
        format!("{{{{ {} }}}}", guard.trim())
    };
    let rendered = engine.render_value(&template, data)?;
    Ok(rendered.trim().eq_ignore_ascii_case("true"))
}

/// Produce the indexed copies for an iteration node.
fn unroll(node: &DocumentNode, each: &str, data: &Value) -> Result<Vec<DocumentNode>, ExpandError> {
    let each = each.trim();
    let count = match path::resolve(data, each) {
        Some(Value::Array(items)) => items.len(),
        other => {
            return Err(ExpandError::IterationSourceNotArray {
                path: each.to_string(),
                found: describe(other),
            });
        }
    };
    tracing::debug!(path = each, count, "unrolling iteration");

    let copies = match node.content.as_slice() {
        [list] if list.kind.is_list() => {
            if count == 0 {
                return Ok(Vec::new());
            }
            let mut wrapper = list.clone();
            wrapper.content = indexed_copies(&list.content, each, count);
            vec![wrapper]
        }
        content => indexed_copies(content, each, count),
    };
    Ok(copies)
}

fn indexed_copies(template: &[DocumentNode], each: &str, count: usize) -> Vec<DocumentNode> {
    let mut copies = Vec::with_capacity(template.len() * count);
    for index in 0..count {
        for node in template {
            let mut copy = node.clone();
            index_subtree(&mut copy, each, index);
            copies.push(copy);
        }
    }
    copies
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "nothing".to_string(),
        Some(Value::Bool(_)) => "a boolean".to_string(),
        Some(Value::Number(_)) => "a number".to_string(),
        Some(Value::String(_)) => "a string".to_string(),
        Some(Value::Object(_)) => "an object".to_string(),
        Some(Value::Array(_)) => "an array".to_string(),
    }
}
