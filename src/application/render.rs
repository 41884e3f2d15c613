//! Serializer: hierarchy → output document
//!
//! JSON nodes have the shape
//! `{"employee": {"email": "…", "direct_reports": [ … ]}}`.
//! The manager reference is reconstruction metadata and never rendered.
//! Rendering walks the tree with explicit stacks, so depth is not limited by
//! the call stack.

use generational_arena::Index;
use serde::{Deserialize, Serialize};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::TreeArena;

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Nested JSON document
    #[default]
    Json,
    /// Indented text tree
    Tree,
}

/// Nesting levels after which pretty output stops indenting further.
pub const MAX_INDENT_LEVEL: usize = 96;

/// Render `tree` in `format`.
///
/// An empty tree renders as JSON `null` or the text "Empty tree".
pub fn render(tree: &TreeArena, format: OutputFormat, pretty: bool) -> ApplicationResult<String> {
    match format {
        OutputFormat::Json => write_json(tree, pretty),
        OutputFormat::Tree => Ok(tree.to_tree_string().to_string()),
    }
}

enum Step {
    Enter { idx: Index, level: usize, first: bool },
    Leave { level: usize, has_reports: bool },
}

/// Write the nested employee document with an explicit stack.
///
/// Produces the same text `serde_json` would for the nested
/// `{"employee": {"email", "direct_reports"}}` shape, without recursing per
/// level.
fn write_json(tree: &TreeArena, pretty: bool) -> ApplicationResult<String> {
    let Some(root) = tree.root() else {
        return Ok("null".to_string());
    };

    let mut out = String::new();
    let mut stack = vec![Step::Enter {
        idx: root,
        level: 0,
        first: true,
    }];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter { idx, level, first } => {
                let Some(node) = tree.get_node(idx) else {
                    continue;
                };
                let email = serde_json::to_string(&node.data.identity).map_err(|e| {
                    ApplicationError::Render {
                        message: e.to_string(),
                    }
                })?;

                if pretty {
                    if level > 0 {
                        out.push_str(if first { "\n" } else { ",\n" });
                        indent(&mut out, level);
                    }
                    out.push_str("{\n");
                    indent(&mut out, level + 1);
                    out.push_str("\"employee\": {\n");
                    indent(&mut out, level + 2);
                    out.push_str("\"email\": ");
                    out.push_str(&email);
                    out.push_str(",\n");
                    indent(&mut out, level + 2);
                    out.push_str("\"direct_reports\": [");
                } else {
                    if !first {
                        out.push(',');
                    }
                    out.push_str("{\"employee\":{\"email\":");
                    out.push_str(&email);
                    out.push_str(",\"direct_reports\":[");
                }

                stack.push(Step::Leave {
                    level,
                    has_reports: !node.children.is_empty(),
                });
                for (pos, &child) in node.children.iter().enumerate().rev() {
                    stack.push(Step::Enter {
                        idx: child,
                        level: level + 3,
                        first: pos == 0,
                    });
                }
            }
            Step::Leave { level, has_reports } => {
                if pretty {
                    if has_reports {
                        out.push('\n');
                        indent(&mut out, level + 2);
                    }
                    out.push_str("]\n");
                    indent(&mut out, level + 1);
                    out.push_str("}\n");
                    indent(&mut out, level);
                    out.push('}');
                } else {
                    out.push_str("]}}");
                }
            }
        }
    }
    Ok(out)
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level.min(MAX_INDENT_LEVEL) {
        out.push_str("  ");
    }
}
