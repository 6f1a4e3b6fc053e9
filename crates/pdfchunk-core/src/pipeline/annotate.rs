//! Pass 1: split page text into lines and classify each one.

use crate::tokenizer::Tokenizer;
use crate::types::{AnnotatedLine, LineType, PageText};

/// Classify a single line, returning its type and heading level
/// (0 when the line is not a heading).
pub fn classify_line(line: &str) -> (LineType, u32) {
    if line.trim().is_empty() {
        return (LineType::Blank, 0);
    }

    if let Some(level) = markdown_heading_level(line) {
        if level <= 2 {
            return (LineType::MajorHeading, level);
        }
        return (LineType::MinorHeading, level);
    }

    // Numbered section titles ("2.1 Results") read as level-2 headings;
    // PDFs rarely carry literal markdown.
    if is_numbered_heading(line) {
        return (LineType::MajorHeading, 2);
    }

    if is_list_item(line) {
        return (LineType::ListItem, 0);
    }

    if line.contains("```") || line.starts_with("  ") {
        return (LineType::CodeBlock, 0);
    }

    if is_caps_heading(line) {
        return (LineType::MajorHeading, 2);
    }

    (LineType::Normal, 0)
}

/// `^#+\s+.+`: the hash count is the heading level.
fn markdown_heading_level(line: &str) -> Option<u32> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if hashes == 0 {
        return None;
    }
    let rest = &line[hashes..];
    let trimmed = rest.trim_start();
    if trimmed.len() < rest.len() && !trimmed.is_empty() {
        Some(hashes as u32)
    } else {
        None
    }
}

/// `^\d+(\.\d+)*\s+[A-Z]`: section numbers followed by a capitalized title.
fn is_numbered_heading(line: &str) -> bool {
    let mut chars = line.chars().peekable();

    if !chars.peek().is_some_and(char::is_ascii_digit) {
        return false;
    }
    while chars.peek().is_some_and(char::is_ascii_digit) {
        chars.next();
    }
    while chars.peek() == Some(&'.') {
        chars.next();
        if !chars.peek().is_some_and(char::is_ascii_digit) {
            return false;
        }
        while chars.peek().is_some_and(char::is_ascii_digit) {
            chars.next();
        }
    }

    if !chars.peek().is_some_and(|c| c.is_whitespace()) {
        return false;
    }
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }

    chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

/// `^\s*[-*+•]\s+` or `^\s*\d+\.\s+`.
fn is_list_item(line: &str) -> bool {
    let trimmed = line.trim_start();

    let mut chars = trimmed.chars();
    match chars.next() {
        Some('-' | '*' | '+' | '\u{2022}') => chars.next().is_some_and(|c| c == ' '),
        Some(c) if c.is_ascii_digit() => {
            let mut rest = trimmed.char_indices().skip_while(|(_, c)| c.is_ascii_digit());
            match rest.next() {
                Some((_, '.')) => rest.next().is_some_and(|(_, c)| c == ' '),
                _ => false,
            }
        }
        _ => false,
    }
}

/// Short lines that are mostly uppercase ("TABLE OF CONTENTS").
fn is_caps_heading(line: &str) -> bool {
    let len = line.chars().count();
    if !(3..=100).contains(&len) {
        return false;
    }
    let upper = line.chars().filter(|c| c.is_uppercase()).count();
    upper * 10 > len * 7
}

/// Annotate every line of every page with its type, token count and source
/// page number. Token counts computed here are reused by all later passes.
pub fn annotate_lines(pages: &[PageText], tokenizer: &Tokenizer) -> Vec<AnnotatedLine> {
    let mut annotated = Vec::new();

    for page in pages {
        for line in page.text.lines() {
            let (line_type, heading_level) = classify_line(line);
            annotated.push(AnnotatedLine {
                text: line.to_string(),
                line_type,
                token_count: tokenizer.count(line),
                page_number: page.page_number,
                heading_level,
            });
        }
    }

    annotated
}
