//! Per-file YAML frontmatter conversion between MyST and Quarto.
//!
//! Frontmatter is parsed into a [`serde_yml::Mapping`] so key order
//! survives the round trip; keys are remapped individually and re-rendered
//! without sorting.

use serde_yml::{Mapping, Value};

/// MyST-only fields dropped when converting to Quarto.
const MYST_ONLY_FIELDS: [&str; 2] = ["math", "abbreviations"];

fn key(s: &str) -> Value {
    Value::String(s.to_string())
}

/// Split text into frontmatter and body.
///
/// Frontmatter must open with `---` on the first line and close with a
/// bare `---` line. Returns `(None, text)` when no well-formed YAML
/// mapping is present, leaving the document untouched.
pub fn extract_frontmatter(text: &str) -> (Option<Mapping>, String) {
    if text.is_empty() {
        return (None, text.to_string());
    }

    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() < 2 || lines[0].trim() != "---" {
        return (None, text.to_string());
    }

    let Some(end_idx) = lines[1..].iter().position(|l| l.trim() == "---") else {
        return (None, text.to_string());
    };
    let end_idx = end_idx + 1;

    let yaml_text = lines[1..end_idx].join("\n");
    let parsed: Value = match serde_yml::from_str(&yaml_text) {
        Ok(value) => value,
        Err(_) => return (None, text.to_string()),
    };
    let Value::Mapping(fm) = parsed else {
        return (None, text.to_string());
    };

    let body = lines[end_idx + 1..].join("\n");
    (Some(fm), body)
}

/// Prepend `new_fm` as a frontmatter block, replacing any existing one.
pub fn replace_frontmatter(text: &str, new_fm: &Mapping) -> String {
    let (_, body) = extract_frontmatter(text);
    let fm_yaml = serde_yml::to_string(new_fm).unwrap_or_default();
    format!("---\n{fm_yaml}---\n{body}")
}

/// Convert a MyST frontmatter mapping to its Quarto equivalent.
///
/// `kernelspec` collapses to `jupyter`, `exports` becomes the `format`
/// block, `label` becomes `id`, the equation numbering template becomes
/// `crossref.eq-prefix`, and MyST-only fields (`jupytext`, `math`,
/// `abbreviations`) are dropped. Unrecognised keys pass through in order.
pub fn myst_to_quarto_frontmatter(fm: &Mapping) -> Mapping {
    let mut result = Mapping::new();

    for (k, value) in fm {
        let Some(name) = k.as_str() else {
            result.insert(k.clone(), value.clone());
            continue;
        };

        match name {
            "kernelspec" => {
                let kernel = match value {
                    Value::Mapping(m) => m
                        .get("name")
                        .cloned()
                        .unwrap_or_else(|| Value::String("python3".to_string())),
                    other => other.clone(),
                };
                result.insert(key("jupyter"), kernel);
            }
            "jupytext" => {}
            _ if MYST_ONLY_FIELDS.contains(&name) => {}
            "label" => {
                result.insert(key("id"), value.clone());
            }
            "exports" => {
                let mut format_block = Mapping::new();
                if let Some(exports) = value.as_sequence() {
                    for export in exports {
                        let Some(m) = export.as_mapping() else { continue };
                        let Some(fmt) = m.get("format") else { continue };
                        if fmt.is_null() {
                            continue;
                        }
                        let options: Mapping = m
                            .iter()
                            .filter(|(ek, _)| ek.as_str() != Some("format"))
                            .map(|(ek, ev)| (ek.clone(), ev.clone()))
                            .collect();
                        format_block.insert(fmt.clone(), Value::Mapping(options));
                    }
                }
                result.insert(key("format"), Value::Mapping(format_block));
            }
            "numbering" => {
                let template = value
                    .as_mapping()
                    .and_then(|m| m.get("equation"))
                    .and_then(Value::as_mapping)
                    .and_then(|eq| eq.get("template"));
                if let Some(template) = template {
                    if !template.is_null() {
                        let mut crossref = Mapping::new();
                        crossref.insert(key("eq-prefix"), template.clone());
                        result.insert(key("crossref"), Value::Mapping(crossref));
                    }
                }
            }
            _ => {
                result.insert(k.clone(), value.clone());
            }
        }
    }

    result
}

/// Convert a Quarto frontmatter mapping to its MyST equivalent.
///
/// Reverse mapping of [`myst_to_quarto_frontmatter`]. The kernel display
/// name is reconstructed from the kernel name since Quarto does not
/// carry one.
pub fn quarto_to_myst_frontmatter(fm: &Mapping) -> Mapping {
    let mut result = Mapping::new();

    for (k, value) in fm {
        let Some(name) = k.as_str() else {
            result.insert(k.clone(), value.clone());
            continue;
        };

        match name {
            "jupyter" => {
                let kernel_name = match value {
                    Value::String(s) => s.clone(),
                    Value::Mapping(m) => m
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("python3")
                        .to_string(),
                    _ => "python3".to_string(),
                };
                let display_name = kernel_name
                    .replace("python3", "Python 3")
                    .replace("ir", "R");
                let mut kernelspec = Mapping::new();
                kernelspec.insert(key("name"), Value::String(kernel_name));
                kernelspec.insert(key("display_name"), Value::String(display_name));
                result.insert(key("kernelspec"), Value::Mapping(kernelspec));
            }
            "id" => {
                result.insert(key("label"), value.clone());
            }
            "format" => {
                let mut exports = Vec::new();
                if let Some(formats) = value.as_mapping() {
                    for (fmt, options) in formats {
                        let mut export = Mapping::new();
                        export.insert(key("format"), fmt.clone());
                        if let Some(opts) = options.as_mapping() {
                            for (ok, ov) in opts {
                                export.insert(ok.clone(), ov.clone());
                            }
                        }
                        exports.push(Value::Mapping(export));
                    }
                }
                result.insert(key("exports"), Value::Sequence(exports));
            }
            "crossref" => {
                let eq_prefix = value.as_mapping().and_then(|m| m.get("eq-prefix"));
                if let Some(eq_prefix) = eq_prefix {
                    if !eq_prefix.is_null() {
                        let mut template = Mapping::new();
                        template.insert(key("template"), eq_prefix.clone());
                        let mut numbering = Mapping::new();
                        numbering.insert(key("equation"), Value::Mapping(template));
                        result.insert(key("numbering"), Value::Mapping(numbering));
                    }
                }
            }
            _ => {
                result.insert(k.clone(), value.clone());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Mapping {
        serde_yml::from_str(yaml).unwrap()
    }

    #[test]
    fn extract_requires_opening_marker() {
        let (fm, body) = extract_frontmatter("# Heading\n\ntext");
        assert!(fm.is_none());
        assert_eq!(body, "# Heading\n\ntext");
    }

    #[test]
    fn extract_splits_frontmatter_and_body() {
        let text = "---\ntitle: Test\n---\n\n# Body";
        let (fm, body) = extract_frontmatter(text);
        let fm = fm.unwrap();
        assert_eq!(fm.get("title").and_then(Value::as_str), Some("Test"));
        assert_eq!(body, "\n# Body");
    }

    #[test]
    fn extract_rejects_unclosed_frontmatter() {
        let text = "---\ntitle: Test\n\nbody without close";
        let (fm, body) = extract_frontmatter(text);
        assert!(fm.is_none());
        assert_eq!(body, text);
    }

    #[test]
    fn kernelspec_collapses_to_jupyter() {
        let fm = parse("kernelspec:\n  name: python3\n  display_name: Python 3");
        let result = myst_to_quarto_frontmatter(&fm);
        assert_eq!(result.get("jupyter").and_then(Value::as_str), Some("python3"));
    }

    #[test]
    fn jupyter_expands_to_kernelspec_with_display_name() {
        let fm = parse("jupyter: ir");
        let result = quarto_to_myst_frontmatter(&fm);
        let kernelspec = result.get("kernelspec").unwrap().as_mapping().unwrap();
        assert_eq!(kernelspec.get("name").and_then(Value::as_str), Some("ir"));
        assert_eq!(
            kernelspec.get("display_name").and_then(Value::as_str),
            Some("R")
        );
    }

    #[test]
    fn exports_become_format_block() {
        let fm = parse("exports:\n  - format: pdf\n    template: plain\n  - format: docx");
        let result = myst_to_quarto_frontmatter(&fm);
        let format = result.get("format").unwrap().as_mapping().unwrap();
        let pdf = format.get("pdf").unwrap().as_mapping().unwrap();
        assert_eq!(pdf.get("template").and_then(Value::as_str), Some("plain"));
        assert!(format.get("docx").unwrap().as_mapping().unwrap().is_empty());
    }

    #[test]
    fn format_block_becomes_exports() {
        let fm = parse("format:\n  html:\n    toc: true\n  pdf: {}");
        let result = quarto_to_myst_frontmatter(&fm);
        let exports = result.get("exports").unwrap().as_sequence().unwrap();
        assert_eq!(exports.len(), 2);
        let html = exports[0].as_mapping().unwrap();
        assert_eq!(html.get("format").and_then(Value::as_str), Some("html"));
        assert_eq!(html.get("toc"), Some(&Value::Bool(true)));
    }

    #[test]
    fn myst_only_fields_are_dropped() {
        let fm = parse("title: T\nmath:\n  '\\RR': '\\mathbb{R}'\njupytext:\n  formats: md");
        let result = myst_to_quarto_frontmatter(&fm);
        assert_eq!(result.len(), 1);
        assert_eq!(result.get("title").and_then(Value::as_str), Some("T"));
    }

    #[test]
    fn equation_template_maps_to_crossref() {
        let fm = parse("numbering:\n  equation:\n    template: 'Eq. %s'");
        let result = myst_to_quarto_frontmatter(&fm);
        let crossref = result.get("crossref").unwrap().as_mapping().unwrap();
        assert_eq!(
            crossref.get("eq-prefix").and_then(Value::as_str),
            Some("Eq. %s")
        );

        let back = quarto_to_myst_frontmatter(&result);
        let numbering = back.get("numbering").unwrap().as_mapping().unwrap();
        let eq = numbering.get("equation").unwrap().as_mapping().unwrap();
        assert_eq!(eq.get("template").and_then(Value::as_str), Some("Eq. %s"));
    }

    #[test]
    fn replace_frontmatter_preserves_body() {
        let mut fm = Mapping::new();
        fm.insert(key("title"), Value::String("New".to_string()));
        let result = replace_frontmatter("---\ntitle: Old\n---\nbody text", &fm);
        assert!(result.starts_with("---\ntitle: New\n"));
        assert!(result.ends_with("---\nbody text"));
    }
}
