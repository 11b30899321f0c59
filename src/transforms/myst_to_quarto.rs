//! MyST → Quarto transform rules: block directives and inline roles.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::scanner::{DirectiveFrame, Scanner};

// ---------------------------------------------------------------------------
// Inline role patterns
// ---------------------------------------------------------------------------
//
// Every pattern requires the full {role}`…` marker, so plain code spans
// (backticks without a role prefix) can never match.

// {eval}`expr`
static EVAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{eval\}`([^`]+)`").unwrap());

// {cite:t}`key` and {cite:p}`key` must be tried before the generic {cite}.
static CITE_T: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{cite:t\}`([^`]+)`").unwrap());
static CITE_P: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{cite:p\}`([^`]+)`").unwrap());

// {cite}`key` or {cite}`key1,key2,...`
static CITE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{cite\}`([^`]+)`").unwrap());

// {numref}`fig-id` or {numref}`Figure %s <fig-id>`
static NUMREF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{numref\}`([^`]+)`").unwrap());

// {ref}`label`
static REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{ref\}`([^`]+)`").unwrap());

// {eq}`label`
static EQ: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{eq\}`([^`]+)`").unwrap());

// {doc}`path`
static DOC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{doc\}`([^`]+)`").unwrap());

// Trailing <target> inside a numref format string.
static NUMREF_TARGET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([^<>]+)>$").unwrap());

/// Admonition directives that map one-to-one onto Quarto callout classes.
pub const ADMONITION_KINDS: [&str; 5] = ["note", "warning", "tip", "important", "caution"];

/// MyST cell tag -> Quarto cell option comment.
fn tag_to_cell_option(tag: &str) -> Option<&'static str> {
    match tag {
        "remove-cell" => Some("#| include: false"),
        "remove-input" => Some("#| echo: false"),
        "remove-output" => Some("#| output: false"),
        "hide-input" => Some("#| code-fold: true"),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Inline role transforms
// ---------------------------------------------------------------------------

fn replace_cite_keys(keys_raw: &str) -> String {
    let keys: Vec<&str> = keys_raw.split(',').map(str::trim).collect();
    if keys.len() == 1 {
        format!("[@{}]", keys[0])
    } else {
        let cited: Vec<String> = keys.iter().map(|k| format!("@{k}")).collect();
        format!("[{}]", cited.join("; "))
    }
}

/// Transform MyST inline roles to Quarto syntax on a single line.
///
/// Order matters: the `cite:t`/`cite:p` variants are prefixes of the
/// generic `cite` pattern and must be tried first. The `{eq}` role gets an
/// `eq-` prefix added to its label unless one is already present; the
/// reverse rewriter never strips it, so `{eq}`energy`` round-trips to
/// `{eq}`eq-energy`` by design.
pub fn transform_inline(line: &str) -> String {
    if line.is_empty() {
        return line.to_string();
    }

    let result = EVAL.replace_all(line, |c: &Captures| format!("`{{python}} {}`", &c[1]));
    let result = CITE_T.replace_all(&result, |c: &Captures| format!("@{}", c[1].trim()));
    let result = CITE_P.replace_all(&result, |c: &Captures| replace_cite_keys(&c[1]));
    let result = CITE.replace_all(&result, |c: &Captures| replace_cite_keys(&c[1]));
    let result = NUMREF.replace_all(&result, |c: &Captures| {
        let content = c[1].trim().to_string();
        match NUMREF_TARGET.captures(&content) {
            Some(target) => format!("@{}", target[1].trim()),
            None => format!("@{content}"),
        }
    });
    let result = REF.replace_all(&result, |c: &Captures| format!("@{}", c[1].trim()));
    let result = EQ.replace_all(&result, |c: &Captures| {
        let label = c[1].trim();
        if label.starts_with("eq-") {
            format!("@{label}")
        } else {
            format!("@eq-{label}")
        }
    });
    let result = DOC.replace_all(&result, |c: &Captures| {
        let path = c[1].trim();
        format!("[{path}]({path}.qmd)")
    });

    result.into_owned()
}

// ---------------------------------------------------------------------------
// Block directive transforms
// ---------------------------------------------------------------------------

/// Parse a `:tags:` option value like `[remove-input]` or `remove-input`.
fn parse_tags(tags_value: &str) -> Vec<String> {
    tags_value
        .trim()
        .trim_matches(|c| c == '[' || c == ']')
        .split(',')
        .map(|t| t.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Transform a single completed MyST directive to Quarto output lines.
pub fn transform_directive(frame: &DirectiveFrame) -> Vec<String> {
    match frame.name.as_str() {
        "code-cell" => transform_code_cell(frame),
        "figure" => transform_figure(frame),
        "math" => transform_math(frame),
        name if ADMONITION_KINDS.contains(&name) => transform_admonition(frame, name, ""),
        // Generic admonition always maps to the note class plus a title.
        "admonition" => transform_admonition(frame, "note", &frame.argument),
        // These live in frontmatter/config on the Quarto side; drop them.
        "bibliography" | "abstract" | "tableofcontents" => Vec::new(),
        "tab-set" => transform_tab_set(frame),
        "tab-item" => transform_tab_item(frame),
        "margin" => transform_margin(frame),
        "image" => transform_image(frame),
        "table" => transform_table(frame),
        "mermaid" => transform_mermaid(frame),
        _ => transform_unknown(frame),
    }
}

fn transform_code_cell(frame: &DirectiveFrame) -> Vec<String> {
    let mut lang = frame.argument.trim();
    if lang.is_empty() {
        lang = "python";
    }
    if lang == "ipython3" {
        lang = "python";
    }

    let mut lines = vec![format!("```{{{lang}}}")];

    if let Some(tags_value) = frame.options.get("tags") {
        for tag in parse_tags(tags_value) {
            if let Some(option) = tag_to_cell_option(&tag) {
                lines.push(option.to_string());
            }
        }
    }

    if let Some(caption) = frame.options.get("caption") {
        if !caption.is_empty() {
            lines.push(format!("#| fig-cap: \"{caption}\""));
        }
    }

    // Blank separator only when cell option lines were actually produced.
    if lines.len() > 1 {
        lines.push(String::new());
    }

    lines.extend(frame.body_lines.iter().cloned());
    lines.push("```".to_string());
    lines
}

fn transform_figure(frame: &DirectiveFrame) -> Vec<String> {
    let path = frame.argument.trim();
    let caption = frame
        .body_lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut attrs: Vec<String> = Vec::new();
    if let Some(name) = frame.options.get("name") {
        if !name.is_empty() {
            attrs.push(format!("#{name}"));
        }
    }
    if let Some(width) = frame.options.get("width") {
        if !width.is_empty() {
            attrs.push(format!("width=\"{width}\""));
        }
    }

    let mut img_line = format!("![{caption}]({path})");
    if !attrs.is_empty() {
        img_line.push_str(&format!("{{{}}}", attrs.join(" ")));
    }

    vec![img_line]
}

fn transform_math(frame: &DirectiveFrame) -> Vec<String> {
    let mut lines = vec!["$$".to_string()];
    lines.extend(frame.body_lines.iter().cloned());
    match frame.options.get("label").filter(|l| !l.is_empty()) {
        Some(label) => lines.push(format!("$$ {{#{label}}}")),
        None => lines.push("$$".to_string()),
    }
    lines
}

fn transform_admonition(frame: &DirectiveFrame, kind: &str, title: &str) -> Vec<String> {
    let header = if title.is_empty() {
        format!("::: {{.callout-{kind}}}")
    } else {
        format!("::: {{.callout-{kind} title=\"{title}\"}}")
    };
    let mut lines = vec![header];
    lines.extend(frame.body_lines.iter().cloned());
    lines.push(":::".to_string());
    lines
}

fn transform_tab_set(frame: &DirectiveFrame) -> Vec<String> {
    let mut lines = vec!["::: {.panel-tabset}".to_string()];
    lines.extend(frame.body_lines.iter().cloned());
    lines.push(":::".to_string());
    lines
}

fn transform_tab_item(frame: &DirectiveFrame) -> Vec<String> {
    let mut lines = vec![format!("## {}", frame.argument.trim())];
    lines.extend(frame.body_lines.iter().cloned());
    lines
}

fn transform_margin(frame: &DirectiveFrame) -> Vec<String> {
    let mut lines = vec!["::: {.column-margin}".to_string()];
    lines.extend(frame.body_lines.iter().cloned());
    lines.push(":::".to_string());
    lines
}

fn transform_image(frame: &DirectiveFrame) -> Vec<String> {
    let url = frame.argument.trim();
    let alt = frame.options.get("alt").map(String::as_str).unwrap_or("");

    let mut img_line = format!("![{alt}]({url})");
    if let Some(width) = frame.options.get("width") {
        if !width.is_empty() {
            img_line.push_str(&format!("{{width=\"{width}\"}}"));
        }
    }

    vec![img_line]
}

fn transform_table(frame: &DirectiveFrame) -> Vec<String> {
    let caption = frame.argument.trim();
    let name = frame.options.get("name").map(String::as_str).unwrap_or("");

    let mut lines: Vec<String> = frame.body_lines.clone();
    if !name.is_empty() {
        lines.push(format!(": {caption} {{#{name}}}"));
    } else if !caption.is_empty() {
        lines.push(format!(": {caption}"));
    }
    lines
}

fn transform_mermaid(frame: &DirectiveFrame) -> Vec<String> {
    let mut lines = vec!["```{mermaid}".to_string()];
    lines.extend(frame.body_lines.iter().cloned());
    lines.push("```".to_string());
    lines
}

/// Unknown directives pass through with a warning marker; the fence,
/// options, and body are reconstructed so no information is lost.
fn transform_unknown(frame: &DirectiveFrame) -> Vec<String> {
    let mut lines = vec![format!(
        "<!-- WARNING: unknown MyST directive '{}' -->",
        frame.name
    )];
    let fence: String = frame.fence_char.to_string().repeat(frame.fence_len);
    if frame.argument.is_empty() {
        lines.push(format!("{fence}{{{}}}", frame.name));
    } else {
        lines.push(format!("{fence}{{{}}} {}", frame.name, frame.argument));
    }
    for (key, value) in &frame.options {
        lines.push(format!(":{key}: {value}"));
    }
    if !frame.body_lines.is_empty() {
        lines.push(String::new());
        lines.extend(frame.body_lines.iter().cloned());
    }
    lines.push(fence);
    lines
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Convert a full MyST markdown document (body text, frontmatter already
/// removed) to Quarto markdown.
pub fn convert_myst_to_quarto(text: &str) -> String {
    let mut scanner = Scanner::new(transform_directive, Some(transform_inline));
    scanner.scan(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tags_variants() {
        assert_eq!(parse_tags("[remove-input]"), vec!["remove-input"]);
        assert_eq!(parse_tags("remove-input"), vec!["remove-input"]);
        assert_eq!(
            parse_tags("[remove-input, hide-input]"),
            vec!["remove-input", "hide-input"]
        );
        assert_eq!(parse_tags("['remove-cell']"), vec!["remove-cell"]);
        assert!(parse_tags("[]").is_empty());
    }

    #[test]
    fn eq_label_prefixing_is_idempotent() {
        assert_eq!(transform_inline("{eq}`energy`"), "@eq-energy");
        assert_eq!(transform_inline("{eq}`eq-energy`"), "@eq-energy");
    }

    #[test]
    fn numref_format_string_extracts_target() {
        assert_eq!(
            transform_inline("See {numref}`Figure %s <fig-results>`."),
            "See @fig-results."
        );
    }

    #[test]
    fn plain_code_span_untouched() {
        let line = "Use `print()` to output, or type `{ref}` literally.";
        assert_eq!(transform_inline(line), line);
    }
}
