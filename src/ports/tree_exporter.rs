//! Call Tree Exporters
//!
//! Renders a CallTreeNode as JSON, Graphviz DOT with flowchart styling, or an
//! indented text outline.

use serde::{Deserialize, Serialize};

use crate::domain::calltree::CallTreeNode;
use crate::ports::OutputExporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Dot,
    Text,
}

impl OutputFormat {
    pub fn exporter(self) -> Box<dyn OutputExporter> {
        match self {
            OutputFormat::Json => Box::new(JsonExporter),
            OutputFormat::Dot => Box::new(DotExporter),
            OutputFormat::Text => Box::new(TextExporter),
        }
    }
}

pub struct JsonExporter;

impl OutputExporter for JsonExporter {
    fn render(&self, tree: &CallTreeNode) -> String {
        serde_json::to_string_pretty(tree).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize call tree");
            String::new()
        })
    }
}

pub struct DotExporter;

impl OutputExporter for DotExporter {
    fn render(&self, tree: &CallTreeNode) -> String {
        let mut lines = Vec::new();

        lines.push("digraph CallTree {".to_string());
        lines.push("    rankdir=TB;".to_string());
        lines.push("    nodesep=0.6;".to_string());
        lines.push("    ranksep=0.8;".to_string());
        lines.push("    node [fontname=\"Helvetica\", fontsize=12];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=10];".to_string());
        lines.push("".to_string());

        let mut next_id = 0;
        Self::emit(tree, None, 0, &mut next_id, &mut lines);

        lines.push("}".to_string());
        lines.join("\n")
    }
}

impl DotExporter {
    /// One DOT node per tree position, so repeated functions stay distinct.
    fn emit(
        node: &CallTreeNode,
        parent: Option<usize>,
        sequence: usize,
        next_id: &mut usize,
        lines: &mut Vec<String>,
    ) {
        let id = *next_id;
        *next_id += 1;

        let (fill, border, style) = if parent.is_none() {
            ("#a6e3a1", "#40a02b", "filled,rounded") // Green entry
        } else if node.segments.is_none() {
            ("#6c7086", "#5c5f77", "filled,dashed") // Gray: not expanded
        } else {
            ("#89b4fa", "#1e66f5", "filled") // Blue
        };
        lines.push(format!(
            "    n{} [label=\"{}\\n{}\", shape=box, style=\"{}\", fillcolor=\"{}\", color=\"{}\"];",
            id,
            escape_label(&node.name),
            escape_label(&node.qualified_name),
            style,
            fill,
            border
        ));

        if let Some(parent_id) = parent {
            let label = node
                .call_line
                .as_deref()
                .map(|l| format!("{}: {}", sequence, escape_label(l)))
                .unwrap_or_else(|| sequence.to_string());
            lines.push(format!("    n{} -> n{} [label=\"{}\"];", parent_id, id, label));
        }

        for (i, child) in node.children.iter().enumerate() {
            Self::emit(child, Some(id), i + 1, next_id, lines);
        }
    }
}

fn escape_label(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

pub struct TextExporter;

impl OutputExporter for TextExporter {
    fn render(&self, tree: &CallTreeNode) -> String {
        let mut out = String::new();
        out.push_str(&tree.qualified_name);
        out.push('\n');
        Self::write_children(tree, "", &mut out);
        out
    }
}

impl TextExporter {
    fn write_children(node: &CallTreeNode, prefix: &str, out: &mut String) {
        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate() {
            let last = i + 1 == count;
            out.push_str(prefix);
            out.push_str(if last { "└── " } else { "├── " });
            out.push_str(&child.qualified_name);
            if let Some(line) = &child.call_line {
                out.push_str("  # ");
                out.push_str(line);
            }
            out.push('\n');
            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            Self::write_children(child, &child_prefix, out);
        }
    }
}
