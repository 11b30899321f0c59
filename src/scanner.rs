//! Line scanner engine for MyST directive detection and processing.
//!
//! The scanner walks a document top to bottom keeping a stack of open
//! directives. Nesting flattens on the way out: when a frame closes, its
//! transform result is spliced into the parent frame's body, or into the
//! final output when the frame was top-level. Plain code fences are tracked
//! separately so their contents are copied through untouched.

use indexmap::IndexMap;

use crate::fence::{self, CodeFenceOpen};

/// The in-progress parse state of one open MyST directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveFrame {
    /// Directive name, e.g. "code-cell", "note", "figure".
    pub name: String,
    /// '`' or ':'.
    pub fence_char: char,
    /// Marker count of the opening fence (>= 3).
    pub fence_len: usize,
    /// Free-text remainder of the opening fence line (language, path, title).
    pub argument: String,
    /// `:key: value` options, in source order.
    pub options: IndexMap<String, String>,
    /// Body content with the directive's own indentation stripped.
    pub body_lines: Vec<String>,
    /// Leading whitespace count of the opening fence line.
    pub indent: usize,
}

impl DirectiveFrame {
    fn open(open: fence::DirectiveOpen) -> Self {
        DirectiveFrame {
            name: open.name,
            fence_char: open.fence_char,
            fence_len: open.fence_len,
            argument: open.argument,
            options: IndexMap::new(),
            body_lines: Vec::new(),
            indent: open.indent,
        }
    }
}

/// Produces target-dialect lines for one completed directive.
pub type TransformFn = fn(&DirectiveFrame) -> Vec<String>;

/// Rewrites inline constructs on a single line outside any directive.
pub type InlineFn = fn(&str) -> String;

/// Regex-based line scanner with a directive stack.
pub struct Scanner {
    stack: Vec<DirectiveFrame>,
    transform: TransformFn,
    inline: Option<InlineFn>,
}

impl Scanner {
    pub fn new(transform: TransformFn, inline: Option<InlineFn>) -> Self {
        Scanner {
            stack: Vec::new(),
            transform,
            inline,
        }
    }

    /// Process `text` line by line and return the transformed output.
    ///
    /// Unterminated directives are force-closed at end of input, popped in
    /// LIFO order so an unclosed inner directive still renders inside its
    /// parent. Malformed input degrades to passthrough, never an error.
    pub fn scan(&mut self, text: &str) -> String {
        let mut output: Vec<String> = Vec::new();
        // True while the next non-close line may still be an option line
        // of the most recently opened frame.
        let mut in_options = false;
        // Plain code fences are only tracked outside any directive.
        let mut code_fence: Option<CodeFenceOpen> = None;

        for line in text.split('\n') {
            let stripped = line.trim_start();
            let indent = line.len() - stripped.len();

            // Directive fences take precedence everywhere except inside a
            // plain code fence.
            if code_fence.is_none() {
                if let Some(open) = fence::directive_open(line) {
                    self.stack.push(DirectiveFrame::open(open));
                    in_options = true;
                    continue;
                }
            }

            if let Some(top) = self.stack.last_mut() {
                let (fence_char, fence_len, frame_indent) =
                    (top.fence_char, top.fence_len, top.indent);

                // Closing fence for the top frame?
                if fence::is_close_fence(stripped, indent, fence_char, fence_len, frame_indent) {
                    if let Some(frame) = self.stack.pop() {
                        let transformed = (self.transform)(&frame);
                        match self.stack.last_mut() {
                            Some(parent) => parent.body_lines.extend(transformed),
                            None => output.extend(transformed),
                        }
                    }
                    in_options = false;
                    continue;
                }

                let content = fence::strip_indent(line, frame_indent);

                if in_options {
                    if let Some((key, value)) = fence::option_line(content.trim()) {
                        top.options.insert(key, value);
                        continue;
                    }
                    // First non-option line ends the options section for good;
                    // a single blank separator line is swallowed.
                    in_options = false;
                    if content.trim().is_empty() {
                        continue;
                    }
                }

                top.body_lines.push(content.to_string());
                continue;
            }

            // Outside any directive: plain code fences pass through verbatim
            // and suppress inline rewriting.
            if let Some(open) = code_fence {
                if fence::is_close_fence(
                    stripped,
                    indent,
                    open.fence_char,
                    open.fence_len,
                    open.indent,
                ) {
                    code_fence = None;
                }
                output.push(line.to_string());
                continue;
            }
            if let Some(open) = fence::code_fence_open(line) {
                code_fence = Some(open);
                output.push(line.to_string());
                continue;
            }

            match self.inline {
                Some(inline) => output.push(inline(line)),
                None => output.push(line.to_string()),
            }
        }

        // Forced close: drain remaining frames LIFO.
        while let Some(frame) = self.stack.pop() {
            let transformed = (self.transform)(&frame);
            match self.stack.last_mut() {
                Some(parent) => parent.body_lines.extend(transformed),
                None => output.extend(transformed),
            }
        }

        output.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passthrough(frame: &DirectiveFrame) -> Vec<String> {
        let mut lines = vec![format!("[{}|{}]", frame.name, frame.argument)];
        for (key, value) in &frame.options {
            lines.push(format!("[opt {key}={value}]"));
        }
        lines.extend(frame.body_lines.clone());
        lines.push("[end]".to_string());
        lines
    }

    fn shout(line: &str) -> String {
        line.to_uppercase()
    }

    #[test]
    fn directive_collects_argument_options_and_body() {
        let text = "```{figure} plot.png\n:name: fig-x\n:width: 50%\n\nA caption.\n```";
        let mut scanner = Scanner::new(passthrough, None);
        let result = scanner.scan(text);
        assert_eq!(
            result,
            "[figure|plot.png]\n[opt name=fig-x]\n[opt width=50%]\nA caption.\n[end]"
        );
    }

    #[test]
    fn options_section_ends_at_first_non_option() {
        let text = "```{note}\nBody first.\n:not: an option anymore\n```";
        let mut scanner = Scanner::new(passthrough, None);
        let result = scanner.scan(text);
        // The pseudo-option line after body content stays body content.
        assert!(result.contains("Body first."));
        assert!(result.contains(":not: an option anymore"));
        assert!(!result.contains("[opt not="));
    }

    #[test]
    fn nested_directives_flatten_into_parent_body() {
        let text = "::::{tab-set}\n:::{tab-item} One\nHello\n:::\n::::";
        let mut scanner = Scanner::new(passthrough, None);
        let result = scanner.scan(text);
        assert_eq!(
            result,
            "[tab-set|]\n[tab-item|One]\nHello\n[end]\n[end]"
        );
    }

    #[test]
    fn close_fence_char_must_match() {
        // A colon run can never close a backtick directive.
        let text = "```{note}\nBody\n:::\n```";
        let mut scanner = Scanner::new(passthrough, None);
        let result = scanner.scan(text);
        assert!(result.contains(":::"));
        assert!(result.ends_with("[end]"));
    }

    #[test]
    fn close_fence_must_be_at_least_open_length() {
        let text = "````{note}\nBody\n```\n````";
        let mut scanner = Scanner::new(passthrough, None);
        let result = scanner.scan(text);
        // The shorter fence is body, the 4-run closes.
        assert_eq!(result, "[note|]\nBody\n```\n[end]");
    }

    #[test]
    fn indented_directive_strips_its_indent() {
        let text = "  ```{note}\n  Indented body\n  ```";
        let mut scanner = Scanner::new(passthrough, None);
        let result = scanner.scan(text);
        assert_eq!(result, "[note|]\nIndented body\n[end]");
    }

    #[test]
    fn unterminated_directives_force_close_lifo() {
        let text = "::::{tab-set}\n:::{tab-item} One\nDangling";
        let mut scanner = Scanner::new(passthrough, None);
        let result = scanner.scan(text);
        // Inner drains into the outer frame's body before the outer drains.
        assert_eq!(
            result,
            "[tab-set|]\n[tab-item|One]\nDangling\n[end]\n[end]"
        );
    }

    #[test]
    fn plain_code_fence_suppresses_everything() {
        let text = "```python\n# {cite}`x` and ```{note}\n```\nafter";
        let mut scanner = Scanner::new(passthrough, Some(shout));
        let result = scanner.scan(text);
        assert!(result.contains("# {cite}`x` and ```{note}"));
        assert!(result.contains("AFTER"));
    }

    #[test]
    fn inline_rewriter_applies_outside_directives_only() {
        let text = "hello\n```{note}\nworld\n```";
        let mut scanner = Scanner::new(passthrough, Some(shout));
        let result = scanner.scan(text);
        assert!(result.starts_with("HELLO"));
        assert!(result.contains("world"));
    }
}
