//! Project configuration conversion: `myst.yml` <-> `_quarto.yml`.
//!
//! MyST nests everything under a `project:` key (with an optional `site:`
//! key for theming); Quarto splits book projects into `project:` /
//! `book:` blocks and hoists article metadata to the top level. Both
//! files are YAML, handled as ordered mappings so output key order tracks
//! input order.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yml::{Mapping, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error for {path}: {source}")]
    Io {
        source: std::io::Error,
        path: String,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    Parse {
        source: serde_yml::Error,
        path: String,
    },
}

fn key(s: &str) -> Value {
    Value::String(s.to_string())
}

/// A MyST config describes a book when the site template is `book-theme`
/// or the project carries an explicit `toc`.
fn is_book_project(myst_config: &Mapping) -> bool {
    let template = myst_config
        .get("site")
        .and_then(Value::as_mapping)
        .and_then(|site| site.get("template"))
        .and_then(Value::as_str);
    if template == Some("book-theme") {
        return true;
    }
    myst_config
        .get("project")
        .and_then(Value::as_mapping)
        .is_some_and(|project| project.contains_key("toc"))
}

/// MyST toc entries (`- file: intro`) to a Quarto chapter list
/// (`- intro.qmd`). Entries without a usable file name are skipped.
fn toc_to_chapters(toc: &[Value]) -> Vec<Value> {
    let mut chapters = Vec::new();
    for entry in toc {
        let name = match entry {
            Value::Mapping(m) => m.get("file").and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        };
        let Some(name) = name else { continue };
        let stem = name.strip_suffix(".md").unwrap_or(name);
        chapters.push(Value::String(format!("{stem}.qmd")));
    }
    chapters
}

/// Quarto chapter list back to MyST toc entries, extensions stripped.
fn chapters_to_toc(chapters: &[Value]) -> Vec<Value> {
    let mut toc = Vec::new();
    for chapter in chapters {
        let Some(name) = chapter.as_str() else { continue };
        let stem = name
            .strip_suffix(".qmd")
            .or_else(|| name.strip_suffix(".md"))
            .unwrap_or(name);
        let mut entry = Mapping::new();
        entry.insert(key("file"), Value::String(stem.to_string()));
        toc.push(Value::Mapping(entry));
    }
    toc
}

/// MyST and Quarto author entries share the same shape; `name` and
/// `affiliations` are ordered first, other fields follow.
fn convert_authors(authors: &[Value]) -> Vec<Value> {
    let mut result = Vec::new();
    for author in authors {
        let Some(m) = author.as_mapping() else {
            result.push(author.clone());
            continue;
        };
        let mut entry = Mapping::new();
        if let Some(name) = m.get("name") {
            entry.insert(key("name"), name.clone());
        }
        if let Some(affiliations) = m.get("affiliations") {
            entry.insert(key("affiliations"), affiliations.clone());
        }
        for (k, v) in m {
            if k.as_str() != Some("name") && k.as_str() != Some("affiliations") {
                entry.insert(k.clone(), v.clone());
            }
        }
        result.push(Value::Mapping(entry));
    }
    result
}

fn exports_to_format(exports: &[Value]) -> Mapping {
    let mut format_block = Mapping::new();
    for export in exports {
        let Some(m) = export.as_mapping() else { continue };
        let Some(fmt) = m.get("format") else { continue };
        if fmt.is_null() {
            continue;
        }
        let options: Mapping = m
            .iter()
            .filter(|(k, _)| k.as_str() != Some("format"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        format_block.insert(fmt.clone(), Value::Mapping(options));
    }
    format_block
}

fn format_to_exports(format_block: &Mapping) -> Vec<Value> {
    let mut exports = Vec::new();
    for (fmt, options) in format_block {
        let mut export = Mapping::new();
        export.insert(key("format"), fmt.clone());
        if let Some(opts) = options.as_mapping() {
            for (k, v) in opts {
                export.insert(k.clone(), v.clone());
            }
        }
        exports.push(Value::Mapping(export));
    }
    exports
}

/// Shared metadata fields carried by both project types, as
/// (myst key, quarto key) pairs.
const COMMON_FIELDS: [(&str, &str); 5] = [
    ("github", "repo-url"),
    ("license", "license"),
    ("keywords", "keywords"),
    ("date", "date"),
    ("subject", "description"),
];

/// Convert a parsed `myst.yml` mapping to a `_quarto.yml` mapping.
pub fn myst_to_quarto_config(myst_config: &Mapping) -> Mapping {
    let mut result = Mapping::new();

    let Some(project) = myst_config.get("project").and_then(Value::as_mapping) else {
        return result;
    };

    if is_book_project(myst_config) {
        let mut project_block = Mapping::new();
        project_block.insert(key("type"), Value::String("book".to_string()));
        result.insert(key("project"), Value::Mapping(project_block));

        let mut book = Mapping::new();
        if let Some(title) = project.get("title") {
            book.insert(key("title"), title.clone());
        }
        if let Some(authors) = project.get("authors").and_then(Value::as_sequence) {
            book.insert(key("author"), Value::Sequence(convert_authors(authors)));
        }
        if let Some(toc) = project.get("toc").and_then(Value::as_sequence) {
            book.insert(key("chapters"), Value::Sequence(toc_to_chapters(toc)));
        }
        result.insert(key("book"), Value::Mapping(book));
    } else {
        if let Some(title) = project.get("title") {
            result.insert(key("title"), title.clone());
        }
        if let Some(authors) = project.get("authors").and_then(Value::as_sequence) {
            result.insert(key("author"), Value::Sequence(convert_authors(authors)));
        }
    }

    if let Some(bibliography) = project.get("bibliography") {
        result.insert(key("bibliography"), bibliography.clone());
    }
    if let Some(exports) = project.get("exports").and_then(Value::as_sequence) {
        result.insert(key("format"), Value::Mapping(exports_to_format(exports)));
    }
    for (myst_key, quarto_key) in COMMON_FIELDS {
        if let Some(value) = project.get(myst_key) {
            result.insert(key(quarto_key), value.clone());
        }
    }

    result
}

/// Convert a parsed `_quarto.yml` mapping to a `myst.yml` mapping.
pub fn quarto_to_myst_config(quarto_config: &Mapping) -> Mapping {
    let mut result = Mapping::new();
    let mut project = Mapping::new();

    let is_book = quarto_config
        .get("project")
        .and_then(Value::as_mapping)
        .and_then(|p| p.get("type"))
        .and_then(Value::as_str)
        == Some("book")
        || quarto_config.contains_key("book");

    if is_book {
        if let Some(book) = quarto_config.get("book").and_then(Value::as_mapping) {
            if let Some(title) = book.get("title") {
                project.insert(key("title"), title.clone());
            }
            if let Some(author) = book.get("author") {
                project.insert(key("authors"), author.clone());
            }
            if let Some(chapters) = book.get("chapters").and_then(Value::as_sequence) {
                project.insert(key("toc"), Value::Sequence(chapters_to_toc(chapters)));
            }
        }
        let mut site = Mapping::new();
        site.insert(key("template"), Value::String("book-theme".to_string()));
        result.insert(key("site"), Value::Mapping(site));
    } else {
        if let Some(title) = quarto_config.get("title") {
            project.insert(key("title"), title.clone());
        }
        if let Some(author) = quarto_config.get("author") {
            project.insert(key("authors"), author.clone());
        }
    }

    if let Some(bibliography) = quarto_config.get("bibliography") {
        project.insert(key("bibliography"), bibliography.clone());
    }
    if let Some(format) = quarto_config.get("format").and_then(Value::as_mapping) {
        project.insert(key("exports"), Value::Sequence(format_to_exports(format)));
    }
    for (myst_key, quarto_key) in COMMON_FIELDS {
        if let Some(value) = quarto_config.get(quarto_key) {
            project.insert(key(myst_key), value.clone());
        }
    }

    if !project.is_empty() {
        result.insert(key("project"), Value::Mapping(project));
    }

    result
}

fn read_yaml(path: &Path) -> Result<Mapping, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.display().to_string(),
    })?;
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let value: Value = serde_yml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.display().to_string(),
    })?;
    match value {
        Value::Mapping(m) => Ok(m),
        _ => Ok(Mapping::new()),
    }
}

fn write_yaml(path: &Path, mapping: &Mapping) -> Result<(), ConfigError> {
    let yaml = serde_yml::to_string(mapping).map_err(|source| ConfigError::Parse {
        source,
        path: path.display().to_string(),
    })?;
    fs::write(path, yaml).map_err(|source| ConfigError::Io {
        source,
        path: path.display().to_string(),
    })
}

/// Read `myst.yml`, convert, and write `_quarto.yml` into `output_dir`.
/// Returns the output path.
pub fn convert_myst_config(myst_yml_path: &Path, output_dir: &Path) -> Result<PathBuf, ConfigError> {
    let myst_config = read_yaml(myst_yml_path)?;
    let quarto_config = myst_to_quarto_config(&myst_config);
    let output_path = output_dir.join("_quarto.yml");
    write_yaml(&output_path, &quarto_config)?;
    Ok(output_path)
}

/// Read `_quarto.yml`, convert, and write `myst.yml` into `output_dir`.
/// Returns the output path.
pub fn convert_quarto_config(
    quarto_yml_path: &Path,
    output_dir: &Path,
) -> Result<PathBuf, ConfigError> {
    let quarto_config = read_yaml(quarto_yml_path)?;
    let myst_config = quarto_to_myst_config(&quarto_config);
    let output_path = output_dir.join("myst.yml");
    write_yaml(&output_path, &myst_config)?;
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Mapping {
        serde_yml::from_str(yaml).unwrap()
    }

    #[test]
    fn book_detection_via_template_or_toc() {
        assert!(is_book_project(&parse(
            "site:\n  template: book-theme\nproject:\n  title: T"
        )));
        assert!(is_book_project(&parse(
            "project:\n  toc:\n    - file: intro"
        )));
        assert!(!is_book_project(&parse("project:\n  title: Article")));
    }

    #[test]
    fn book_config_produces_chapters() {
        let myst = parse(
            "project:\n  title: My Book\n  toc:\n    - file: intro\n    - file: methods.md\n    - summary",
        );
        let quarto = myst_to_quarto_config(&myst);
        let project = quarto.get("project").unwrap().as_mapping().unwrap();
        assert_eq!(project.get("type").and_then(Value::as_str), Some("book"));
        let book = quarto.get("book").unwrap().as_mapping().unwrap();
        let chapters = book.get("chapters").unwrap().as_sequence().unwrap();
        let names: Vec<&str> = chapters.iter().filter_map(Value::as_str).collect();
        assert_eq!(names, vec!["intro.qmd", "methods.qmd", "summary.qmd"]);
    }

    #[test]
    fn article_config_hoists_title() {
        let myst = parse("project:\n  title: Paper\n  github: https://github.com/u/r");
        let quarto = myst_to_quarto_config(&myst);
        assert_eq!(quarto.get("title").and_then(Value::as_str), Some("Paper"));
        assert_eq!(
            quarto.get("repo-url").and_then(Value::as_str),
            Some("https://github.com/u/r")
        );
        assert!(!quarto.contains_key("book"));
    }

    #[test]
    fn chapters_round_trip_to_toc() {
        let quarto = parse(
            "project:\n  type: book\nbook:\n  title: My Book\n  chapters:\n    - intro.qmd\n    - methods.qmd",
        );
        let myst = quarto_to_myst_config(&quarto);
        let site = myst.get("site").unwrap().as_mapping().unwrap();
        assert_eq!(
            site.get("template").and_then(Value::as_str),
            Some("book-theme")
        );
        let project = myst.get("project").unwrap().as_mapping().unwrap();
        let toc = project.get("toc").unwrap().as_sequence().unwrap();
        assert_eq!(toc.len(), 2);
        assert_eq!(
            toc[0].as_mapping().unwrap().get("file").and_then(Value::as_str),
            Some("intro")
        );
    }

    #[test]
    fn exports_and_description_map_both_ways() {
        let myst = parse(
            "project:\n  title: Paper\n  subject: A study\n  exports:\n    - format: pdf\n      template: plain",
        );
        let quarto = myst_to_quarto_config(&myst);
        assert_eq!(
            quarto.get("description").and_then(Value::as_str),
            Some("A study")
        );
        let format = quarto.get("format").unwrap().as_mapping().unwrap();
        let pdf = format.get("pdf").unwrap().as_mapping().unwrap();
        assert_eq!(pdf.get("template").and_then(Value::as_str), Some("plain"));

        let back = quarto_to_myst_config(&quarto);
        let project = back.get("project").unwrap().as_mapping().unwrap();
        assert_eq!(
            project.get("subject").and_then(Value::as_str),
            Some("A study")
        );
        let exports = project.get("exports").unwrap().as_sequence().unwrap();
        assert_eq!(
            exports[0]
                .as_mapping()
                .unwrap()
                .get("format")
                .and_then(Value::as_str),
            Some("pdf")
        );
    }

    #[test]
    fn empty_config_converts_to_empty() {
        assert!(myst_to_quarto_config(&Mapping::new()).is_empty());
        assert!(quarto_to_myst_config(&Mapping::new()).is_empty());
        assert!(myst_to_quarto_config(&parse("version: 1")).is_empty());
    }

    #[test]
    fn config_files_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let myst_path = dir.path().join("myst.yml");
        fs::write(
            &myst_path,
            "project:\n  title: Demo\n  toc:\n    - file: index\n",
        )
        .unwrap();

        let quarto_path = convert_myst_config(&myst_path, dir.path()).unwrap();
        assert_eq!(quarto_path.file_name().unwrap(), "_quarto.yml");
        let quarto_text = fs::read_to_string(&quarto_path).unwrap();
        assert!(quarto_text.contains("type: book"));
        assert!(quarto_text.contains("index.qmd"));

        let out_dir = dir.path().join("back");
        fs::create_dir(&out_dir).unwrap();
        let myst_out = convert_quarto_config(&quarto_path, &out_dir).unwrap();
        let myst_text = fs::read_to_string(&myst_out).unwrap();
        assert!(myst_text.contains("book-theme"));
        assert!(myst_text.contains("file: index"));
    }
}
