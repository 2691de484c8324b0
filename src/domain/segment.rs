//! Code Segment Extractor
//!
//! Slices a function body into alternating plain-code and call segments so the
//! body can be read back around each call it makes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

use crate::domain::callgraph::{CallId, CallRecord, QualifiedName};
use crate::domain::source::SourceUnit;
use crate::domain::syntax::{find_function, last_line, start_line};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    Code {
        content: String,
    },
    Call {
        content: String,
        callee: QualifiedName,
        call_id: CallId,
    },
}

impl Segment {
    pub fn content(&self) -> &str {
        match self {
            Segment::Code { content } | Segment::Call { content, .. } => content,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Segment::Call { .. })
    }
}

/// Qualified name -> segments of that function's body.
pub type SegmentTable = BTreeMap<QualifiedName, Vec<Segment>>;

/// Segments for the function named `simple_name` in `unit`.
///
/// The function is looked up by simple name; when several definitions share
/// it, the first in file order wins. A name that cannot be found yields no
/// segments.
pub fn extract_segments(
    unit: &SourceUnit,
    root: Node,
    simple_name: &str,
    calls: &[CallRecord],
) -> Vec<Segment> {
    match find_function(root, unit.bytes(), simple_name) {
        Some(function) => segment_lines(unit, start_line(function), last_line(function), calls),
        None => {
            tracing::debug!(
                file = %unit.path.display(),
                function = simple_name,
                "no definition found for segment extraction"
            );
            Vec::new()
        }
    }
}

/// Cut lines `def_line + 1 ..= end_line` at each call line.
pub fn segment_lines(
    unit: &SourceUnit,
    def_line: usize,
    end_line: usize,
    calls: &[CallRecord],
) -> Vec<Segment> {
    // Calls of a later same-named definition fall outside this range.
    let mut ordered: Vec<&CallRecord> = calls
        .iter()
        .filter(|call| def_line <= call.line && call.line <= end_line)
        .collect();
    ordered.sort_by_key(|call| call.line);

    let mut segments = Vec::new();
    let mut last_cut = def_line;

    for call in ordered {
        if call.line > last_cut {
            push_code(&mut segments, unit.lines_between(last_cut, call.line - 1));
        }
        segments.push(Segment::Call {
            content: call.source.clone(),
            callee: call.callee.clone(),
            call_id: call.call_id,
        });
        last_cut = last_cut.max(call.line);
    }

    if last_cut < end_line {
        push_code(&mut segments, unit.lines_between(last_cut, end_line));
    }
    segments
}

fn push_code(segments: &mut Vec<Segment>, text: String) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        segments.push(Segment::Code {
            content: trimmed.to_string(),
        });
    }
}
