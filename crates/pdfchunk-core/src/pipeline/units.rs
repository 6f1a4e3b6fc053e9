//! Pass 2: group annotated lines into semantic units.
//!
//! A heading always begins its own unit, and a blank line immediately
//! followed by a heading closes the current unit, so heading-introduced
//! sections stay intact for the packing pass.

use crate::types::{AnnotatedLine, LineType, SemanticUnit};

fn is_heading(line: &AnnotatedLine) -> bool {
    matches!(
        line.line_type,
        LineType::MajorHeading | LineType::MinorHeading
    )
}

/// Walk the annotated lines in order and produce semantic units.
///
/// Leading blank lines are dropped at the start of every unit; interior
/// blanks are kept so the chunk text preserves paragraph breaks. Because the
/// walk is linear over page-ordered lines, the pages of a unit always form a
/// contiguous nondecreasing run.
pub fn build_semantic_units(lines: Vec<AnnotatedLine>) -> Vec<SemanticUnit> {
    let mut units = Vec::new();
    let mut current = SemanticUnit::new();

    for i in 0..lines.len() {
        let line = &lines[i];

        let boundary = is_heading(line)
            || (line.line_type == LineType::Blank
                && lines.get(i + 1).is_some_and(is_heading));

        if boundary && !current.is_empty() {
            units.push(std::mem::replace(&mut current, SemanticUnit::new()));
        }

        // Skip blanks at the front of a fresh unit.
        if line.line_type == LineType::Blank && current.is_empty() {
            continue;
        }

        current.push_line(line.clone());
    }

    if !current.is_empty() {
        units.push(current);
    }

    units
}
