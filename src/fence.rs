//! Fence detection for MyST directive blocks and plain code fences.
//!
//! MyST directives open with a run of at least three backticks or colons
//! followed by a braced name: ```` ```{figure} path ```` or `:::{note}`.
//! Plain code fences (``` or ~~~, optional bare-word info string) carry no
//! braces and are never directives. Both kinds close with a line consisting
//! solely of the opening character, repeated at least as many times as the
//! opener, at an indentation no deeper than the opener's.

use regex::Regex;
use std::sync::LazyLock;

/// Minimum marker run for any fence; MyST requires at least three.
pub const MIN_FENCE_LEN: usize = 3;

// Backtick open: ```{directive-name} optional-argument
static BACKTICK_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(`{3,})\{(\w[\w-]*)\}\s*(.*)$").unwrap());

// Colon open: :::{directive-name} optional-argument
static COLON_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(:{3,})\{(\w[\w-]*)\}\s*(.*)$").unwrap());

// Plain code fence: ``` / ~~~ with an optional bare-word info string.
// A braced info string is a directive and is matched above instead.
static CODE_FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(`{3,}|~{3,})(\w*)\s*$").unwrap());

// Option line: :key: value (positional, right after an opening fence)
static OPTION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:(\w[\w-]*):\s*(.*)$").unwrap());

/// A matched directive-opening fence line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveOpen {
    pub indent: usize,
    pub fence_char: char,
    pub fence_len: usize,
    pub name: String,
    pub argument: String,
}

/// A matched plain code-fence opening line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFenceOpen {
    pub indent: usize,
    pub fence_char: char,
    pub fence_len: usize,
}

/// Match a directive-opening fence (either delimiter family).
pub fn directive_open(line: &str) -> Option<DirectiveOpen> {
    let caps = BACKTICK_OPEN.captures(line).or_else(|| COLON_OPEN.captures(line))?;
    let fence = &caps[2];
    Some(DirectiveOpen {
        indent: caps[1].len(),
        fence_char: fence.chars().next()?,
        fence_len: fence.len(),
        name: caps[3].to_string(),
        argument: caps[4].trim().to_string(),
    })
}

/// Match a plain (non-directive) code-fence opening line.
pub fn code_fence_open(line: &str) -> Option<CodeFenceOpen> {
    let caps = CODE_FENCE_OPEN.captures(line)?;
    let fence = &caps[2];
    Some(CodeFenceOpen {
        indent: caps[1].len(),
        fence_char: fence.chars().next()?,
        fence_len: fence.len(),
    })
}

/// Match a `:key: value` option line. Callers pass the indent-stripped,
/// trimmed line; option position relative to the opening fence is the
/// scanner's concern, not the matcher's.
pub fn option_line(content: &str) -> Option<(String, String)> {
    let caps = OPTION_LINE.captures(content)?;
    Some((caps[1].to_string(), caps[2].trim().to_string()))
}

/// Check whether a left-stripped line closes a fence opened with
/// `fence_char` repeated `fence_len` times at `max_indent`.
pub fn is_close_fence(
    stripped: &str,
    indent: usize,
    fence_char: char,
    fence_len: usize,
    max_indent: usize,
) -> bool {
    if stripped.is_empty() {
        return false;
    }
    if !stripped.chars().all(|c| c == fence_char) {
        return false;
    }
    if stripped.chars().count() < fence_len {
        return false;
    }
    indent <= max_indent
}

/// Remove up to `indent` leading whitespace characters from a line.
/// Spaces and tabs each count as one unit; stops at the first
/// non-whitespace character.
pub fn strip_indent(line: &str, indent: usize) -> &str {
    if indent == 0 {
        return line;
    }
    let mut removed = 0;
    for (offset, ch) in line.char_indices() {
        if removed >= indent || (ch != ' ' && ch != '\t') {
            return &line[offset..];
        }
        removed += 1;
    }
    // Line was nothing but strippable whitespace
    &line[line.len()..]
}
