//! Quarto → MyST transform rules: block constructs and inline syntax.
//!
//! Quarto's constructs are not uniformly stack-nestable the way MyST
//! directives are (table captions trail their content, math blocks reuse
//! one symmetric marker), so the reverse direction is a line-oriented
//! detector with per-construct buffering rather than a frame stack.

use fancy_regex::Regex as FancyRegex;
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::fence;

// ---------------------------------------------------------------------------
// Inline patterns (Quarto -> MyST)
// ---------------------------------------------------------------------------

// `{python} expr` -> {eval}`expr`
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`\{python\}\s+([^`]+)`").unwrap());

// [@key1; @key2; ...] -> {cite}`key1,key2,...` (must come before single)
static MULTI_CITE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(@[\w-]+(?:;\s*@[\w-]+)+)\]").unwrap());

// [@key] -> {cite}`key`
static SINGLE_CITE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[@([\w-]+)\]").unwrap());

// Cross-references need lookarounds (word-boundary exclusion on both
// sides, so email local parts never match); fancy-regex provides them.
static FIG_REF: LazyLock<FancyRegex> =
    LazyLock::new(|| FancyRegex::new(r"(?<!\w)@(fig-[\w-]+)(?!\w)").unwrap());
static EQ_REF: LazyLock<FancyRegex> =
    LazyLock::new(|| FancyRegex::new(r"(?<!\w)@(eq-[\w-]+)(?!\w)").unwrap());
static TBL_REF: LazyLock<FancyRegex> =
    LazyLock::new(|| FancyRegex::new(r"(?<!\w)@(tbl-[\w-]+)(?!\w)").unwrap());
static SEC_REF: LazyLock<FancyRegex> =
    LazyLock::new(|| FancyRegex::new(r"(?<!\w)@(sec-[\w-]+)(?!\w)").unwrap());

// Bare citation: @key, not an email tail, not a reserved cross-ref prefix.
static BARE_CITE: LazyLock<FancyRegex> =
    LazyLock::new(|| FancyRegex::new(r"(?<!\w)@((?!fig-|eq-|tbl-|sec-)[\w][\w-]*)(?!\w)").unwrap());

// [text](path.qmd); only rewritten when the text matches the path stem.
static DOC_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^\)]+\.qmd)\)").unwrap());

// ---------------------------------------------------------------------------
// Block patterns
// ---------------------------------------------------------------------------

// Quarto cell option: #| key: value
static CELL_OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\|\s+([\w-]+):\s+(.+)$").unwrap());

// ::: {.callout-TYPE} or ::: {.callout-TYPE title="..."}
static CALLOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(:{3,})\s*\{\.callout-(note|warning|tip|important|caution)(?:\s+title="([^"]*)")?\s*\}"#,
    )
    .unwrap()
});

static TABSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(:{3,})\s*\{\.panel-tabset\}").unwrap());

static MARGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(:{3,})\s*\{\.column-margin\}").unwrap());

// Executable code block: ```{python}, ```{r}, ...
static EXEC_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(`{3,})\{(\w+)\}\s*$").unwrap());

static COLON_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(:{3,})\s*$").unwrap());
static BACKTICK_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(`{3,})\s*$").unwrap());

// Any other backtick/tilde fence opens a plain code region that must pass
// through verbatim.
static PLAIN_FENCE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(`{3,}|~{3,})(.*)$").unwrap());

// ![alt](url){attrs}
static IMG_ATTRS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!\[([^\]]*)\]\(([^)]+)\)\{([^}]+)\}\s*$").unwrap());

// $$ and $$ {#eq-id}
static MATH_CLOSE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\$\s*\{#([\w-]+)\}\s*$").unwrap());
static MATH_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\$\$\s*$").unwrap());

// : Caption, optionally with a trailing {#id}. Only meaningful while table
// rows are buffered.
static TABLE_CAPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:\s+(.+?)\s*(?:\{#([\w-]+)\}\s*)?$").unwrap());

static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\|.*\|\s*$").unwrap());

// Tab labels inside a panel-tabset body.
static TAB_HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^##\s+(.+)$").unwrap());

// Image attribute pieces.
static ATTR_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#([\w-]+)").unwrap());
static ATTR_WIDTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"width="?([^"\s}]+)"?"#).unwrap());

/// Languages Quarto executes; other braced fences are ordinary code.
const EXEC_LANGUAGES: [&str; 9] = [
    "python", "r", "julia", "bash", "sh", "sql", "ojs", "dot", "mermaid",
];

/// Quarto cell option -> MyST cell tag, keyed on both name and value.
fn option_to_tag(key: &str, value: &str) -> Option<&'static str> {
    match (key, value) {
        ("include", "false") => Some("remove-cell"),
        ("echo", "false") => Some("remove-input"),
        ("output", "false") => Some("remove-output"),
        ("code-fold", "true") => Some("hide-input"),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Inline transforms
// ---------------------------------------------------------------------------

/// Transform Quarto inline syntax to MyST roles on a single line.
///
/// Quarto uses `@key` for citations, `` `{python} expr` `` for inline code,
/// and `[text](file.qmd)` for cross-document links. More specific patterns
/// run before less specific ones: the `@fig-`/`@eq-`/`@tbl-`/`@sec-`
/// cross-refs must win over the bare-citation fallback.
pub fn transform_quarto_inline(line: &str) -> String {
    if line.is_empty() {
        return line.to_string();
    }

    let result = INLINE_CODE.replace_all(line, |c: &Captures| format!("{{eval}}`{}`", &c[1]));
    let result = MULTI_CITE.replace_all(&result, |c: &Captures| {
        let keys: Vec<&str> = c[1]
            .split(';')
            .map(|k| k.trim().trim_start_matches('@'))
            .collect();
        format!("{{cite}}`{}`", keys.join(","))
    });
    let result = SINGLE_CITE.replace_all(&result, |c: &Captures| format!("{{cite}}`{}`", &c[1]));

    let result = FIG_REF.replace_all(&result, |c: &fancy_regex::Captures| {
        format!("{{numref}}`{}`", &c[1])
    });
    let result = EQ_REF.replace_all(&result, |c: &fancy_regex::Captures| {
        format!("{{eq}}`{}`", &c[1])
    });
    let result = TBL_REF.replace_all(&result, |c: &fancy_regex::Captures| {
        format!("{{ref}}`{}`", &c[1])
    });
    let result = SEC_REF.replace_all(&result, |c: &fancy_regex::Captures| {
        format!("{{ref}}`{}`", &c[1])
    });
    let result = BARE_CITE.replace_all(&result, |c: &fancy_regex::Captures| {
        format!("{{cite:t}}`{}`", &c[1])
    });

    let result = DOC_LINK.replace_all(&result, |c: &Captures| {
        let text = &c[1];
        let url = &c[2];
        let path = &url[..url.len() - ".qmd".len()];
        let basename = path.rsplit('/').next().unwrap_or(path);
        if text == path || text == basename {
            format!("{{doc}}`{path}`")
        } else {
            c[0].to_string()
        }
    });

    result.into_owned()
}

// ---------------------------------------------------------------------------
// Reverse block builders
// ---------------------------------------------------------------------------

/// Parse leading `#| key: value` lines from an executable cell body.
/// The run ends at the first non-matching line; one blank separator line
/// directly after the run is also consumed.
pub fn parse_cell_options(body: &[String]) -> (IndexMap<String, String>, Vec<String>) {
    let mut options = IndexMap::new();
    let mut rest_start = body.len();
    for (i, line) in body.iter().enumerate() {
        match CELL_OPTION.captures(line.trim()) {
            Some(c) => {
                options.insert(c[1].to_string(), c[2].trim().to_string());
            }
            None => {
                rest_start = i;
                break;
            }
        }
    }

    let mut remaining: Vec<String> = body[rest_start..].to_vec();
    if remaining.first().is_some_and(|l| l.trim().is_empty()) {
        remaining.remove(0);
    }
    (options, remaining)
}

/// Build a MyST code-cell directive from a parsed Quarto code block.
pub fn build_code_cell(
    lang: &str,
    options: &IndexMap<String, String>,
    body: &[String],
) -> Vec<String> {
    let mut lines = vec![format!("```{{code-cell}} {lang}")];

    let mut tags: Vec<&str> = Vec::new();
    let mut caption = String::new();
    for (key, value) in options {
        if let Some(tag) = option_to_tag(key, value) {
            tags.push(tag);
        } else if key == "fig-cap" {
            caption = value.trim_matches('"').trim_matches('\'').to_string();
        }
    }

    if !tags.is_empty() {
        lines.push(format!(":tags: [{}]", tags.join(", ")));
    }
    if !caption.is_empty() {
        lines.push(format!(":caption: {caption}"));
    }
    if lines.len() > 1 {
        lines.push(String::new());
    }

    lines.extend(body.iter().cloned());
    lines.push("```".to_string());
    lines
}

/// Build a MyST admonition directive; a title forces the generic
/// `admonition` form instead of the fixed-kind directive.
pub fn build_admonition(kind: &str, title: &str, body: &[String]) -> Vec<String> {
    let mut lines = if title.is_empty() {
        vec![format!("```{{{kind}}}")]
    } else {
        vec![format!("```{{admonition}} {title}")]
    };
    lines.extend(body.iter().cloned());
    lines.push("```".to_string());
    lines
}

pub fn build_margin(body: &[String]) -> Vec<String> {
    let mut lines = vec!["```{margin}".to_string()];
    lines.extend(body.iter().cloned());
    lines.push("```".to_string());
    lines
}

/// Build a MyST tab-set from a Quarto panel-tabset body: `##` headings
/// become tab-item directives.
pub fn build_tab_set(body: &[String]) -> Vec<String> {
    let mut result = vec!["::::{tab-set}".to_string()];

    let mut current_label: Option<String> = None;
    let mut current_body: Vec<String> = Vec::new();

    let mut flush = |result: &mut Vec<String>, label: &str, body: &mut Vec<String>| {
        while body.last().is_some_and(|l| l.trim().is_empty()) {
            body.pop();
        }
        result.push(format!(":::{{tab-item}} {label}"));
        result.append(body);
        result.push(":::".to_string());
    };

    for line in body {
        if let Some(c) = TAB_HEADING.captures(line) {
            if let Some(label) = current_label.take() {
                flush(&mut result, &label, &mut current_body);
            }
            current_label = Some(c[1].trim().to_string());
            current_body = Vec::new();
        } else {
            current_body.push(line.clone());
        }
    }
    if let Some(label) = current_label {
        flush(&mut result, &label, &mut current_body);
    }

    result.push("::::".to_string());
    result
}

/// Parsed `{...}` attribute group of an image line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImageAttrs {
    pub id: Option<String>,
    pub width: Option<String>,
}

pub fn parse_image_attrs(attr_str: &str) -> ImageAttrs {
    ImageAttrs {
        id: ATTR_ID.captures(attr_str).map(|c| c[1].to_string()),
        width: ATTR_WIDTH.captures(attr_str).map(|c| c[1].to_string()),
    }
}

/// Build a MyST figure directive from a Quarto image with a `#fig-*` id.
pub fn build_figure_directive(alt: &str, url: &str, attrs: &ImageAttrs) -> Vec<String> {
    let mut lines = vec![format!("```{{figure}} {url}")];
    if let Some(id) = &attrs.id {
        lines.push(format!(":name: {id}"));
    }
    if let Some(width) = &attrs.width {
        lines.push(format!(":width: {width}"));
    }
    lines.push(String::new());
    if !alt.is_empty() {
        lines.push(alt.to_string());
    }
    lines.push("```".to_string());
    lines
}

/// Build a MyST image directive from a Quarto image with attributes but no
/// figure id.
pub fn build_image_directive(alt: &str, url: &str, attrs: &ImageAttrs) -> Vec<String> {
    let mut lines = vec![format!("```{{image}} {url}")];
    if !alt.is_empty() {
        lines.push(format!(":alt: {alt}"));
    }
    if let Some(width) = &attrs.width {
        lines.push(format!(":width: {width}"));
    }
    lines.push("```".to_string());
    lines
}

/// Build a MyST math directive from a labelled `$$` block.
pub fn build_math_directive(label: &str, body: &[String]) -> Vec<String> {
    let mut lines = vec!["```{math}".to_string()];
    if !label.is_empty() {
        lines.push(format!(":label: {label}"));
    }
    lines.push(String::new());
    lines.extend(body.iter().cloned());
    lines.push("```".to_string());
    lines
}

/// Wrap buffered table rows in a MyST table directive.
pub fn build_table_directive(caption: &str, name: &str, rows: &[String]) -> Vec<String> {
    let mut lines = vec![format!("```{{table}} {caption}")];
    if !name.is_empty() {
        lines.push(format!(":name: {name}"));
    }
    lines.push(String::new());
    lines.extend(rows.iter().cloned());
    lines.push("```".to_string());
    lines
}

// ---------------------------------------------------------------------------
// Main scan loop
// ---------------------------------------------------------------------------

/// Collect body lines until a closing fence of at least `fence_len`
/// markers. Leaves the cursor on the terminator (or past the end).
fn collect_fenced_body(lines: &[&str], i: &mut usize, close: &Regex, fence_len: usize) -> Vec<String> {
    let mut body = Vec::new();
    *i += 1;
    while *i < lines.len() {
        if let Some(c) = close.captures(lines[*i].trim()) {
            if c[1].len() >= fence_len {
                return body;
            }
        }
        body.push(lines[*i].to_string());
        *i += 1;
    }
    body
}

/// Convert a full Quarto markdown document (body text, frontmatter already
/// removed) to MyST markdown.
///
/// Table rows are withheld in a pending buffer rather than emitted
/// immediately: a trailing caption line retroactively wraps them in a
/// `{table}` directive, while any other non-blank line flushes them
/// through verbatim.
pub fn convert_quarto_to_myst(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut output: Vec<String> = Vec::new();

    // Pending table rows (and interior blanks) awaiting a caption.
    let mut table_buf: Vec<String> = Vec::new();
    let mut in_table = false;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let stripped = line.trim();

        if in_table {
            if let Some(c) = TABLE_CAPTION.captures(stripped) {
                let caption = c[1].trim().to_string();
                let name = c.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
                while table_buf.last().is_some_and(|l| l.trim().is_empty()) {
                    table_buf.pop();
                }
                output.extend(build_table_directive(&caption, &name, &table_buf));
                table_buf.clear();
                in_table = false;
                i += 1;
                continue;
            }
            if TABLE_ROW.is_match(stripped) || stripped.is_empty() {
                table_buf.push(line.to_string());
                i += 1;
                continue;
            }
            // Disqualifying line: flush the buffer verbatim and fall
            // through to normal dispatch for this line.
            output.append(&mut table_buf);
            in_table = false;
        }

        // Executable code block: ```{python}, ```{r}, ...
        if let Some(c) = EXEC_CODE.captures(stripped) {
            let fence_len = c[1].len();
            let lang = c[2].to_string();
            if EXEC_LANGUAGES.contains(&lang.to_lowercase().as_str()) {
                let body = collect_fenced_body(&lines, &mut i, &BACKTICK_CLOSE, fence_len);
                let (options, remaining) = parse_cell_options(&body);
                output.extend(build_code_cell(&lang, &options, &remaining));
                i += 1;
                continue;
            }
            // Unknown executable language: fall through to the plain-fence
            // fast path below.
        }

        // Callout: ::: {.callout-*}
        if let Some(c) = CALLOUT.captures(stripped) {
            let fence_len = c[1].len();
            let kind = c[2].to_string();
            let title = c.get(3).map(|m| m.as_str().to_string()).unwrap_or_default();
            let body = collect_fenced_body(&lines, &mut i, &COLON_CLOSE, fence_len);
            output.extend(build_admonition(&kind, &title, &body));
            i += 1;
            continue;
        }

        // Panel tabset: ::: {.panel-tabset}
        if let Some(c) = TABSET.captures(stripped) {
            let fence_len = c[1].len();
            let body = collect_fenced_body(&lines, &mut i, &COLON_CLOSE, fence_len);
            output.extend(build_tab_set(&body));
            i += 1;
            continue;
        }

        // Column margin: ::: {.column-margin}
        if let Some(c) = MARGIN.captures(stripped) {
            let fence_len = c[1].len();
            let body = collect_fenced_body(&lines, &mut i, &COLON_CLOSE, fence_len);
            output.extend(build_margin(&body));
            i += 1;
            continue;
        }

        // Image or figure with attributes: ![alt](url){attrs}
        if let Some(c) = IMG_ATTRS.captures(stripped) {
            let alt = c[1].to_string();
            let url = c[2].to_string();
            let attrs = parse_image_attrs(&c[3]);

            if attrs.id.as_deref().is_some_and(|id| id.starts_with("fig-")) {
                output.extend(build_figure_directive(&alt, &url, &attrs));
            } else if attrs.id.is_some() || attrs.width.is_some() {
                output.extend(build_image_directive(&alt, &url, &attrs));
            } else {
                output.push(transform_quarto_inline(line));
            }
            i += 1;
            continue;
        }

        // Math block: $$ ... $$ or $$ ... $$ {#eq-id}
        if MATH_OPEN.is_match(stripped) {
            let mut body: Vec<String> = Vec::new();
            let mut label = String::new();
            i += 1;
            while i < lines.len() {
                let math_line = lines[i].trim();
                if let Some(c) = MATH_CLOSE_LABEL.captures(math_line) {
                    label = c[1].to_string();
                    break;
                }
                if MATH_OPEN.is_match(math_line) {
                    break;
                }
                body.push(lines[i].to_string());
                i += 1;
            }

            if label.is_empty() {
                // No label: pass through with its original markers.
                output.push("$$".to_string());
                output.extend(body);
                output.push("$$".to_string());
            } else {
                output.extend(build_math_directive(&label, &body));
            }
            i += 1;
            continue;
        }

        // Start buffering table rows for caption association.
        if TABLE_ROW.is_match(stripped) {
            in_table = true;
            table_buf.clear();
            table_buf.push(line.to_string());
            i += 1;
            continue;
        }

        // Any other fence opens a plain code region: verbatim passthrough,
        // inline rewriting suppressed.
        if let Some(c) = PLAIN_FENCE_OPEN.captures(line) {
            let open_indent = c[1].len();
            let fence = c[2].to_string();
            let fence_char = fence.chars().next().unwrap_or('`');
            output.push(line.to_string());
            i += 1;
            while i < lines.len() {
                let inner = lines[i];
                let inner_stripped = inner.trim_start();
                let indent = inner.len() - inner_stripped.len();
                output.push(inner.to_string());
                if fence::is_close_fence(
                    inner_stripped.trim_end(),
                    indent,
                    fence_char,
                    fence.len(),
                    open_indent,
                ) {
                    break;
                }
                i += 1;
            }
            i += 1;
            continue;
        }

        output.push(transform_quarto_inline(line));
        i += 1;
    }

    if in_table {
        output.append(&mut table_buf);
    }

    output.join("\n")
}
