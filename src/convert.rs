//! File discovery and conversion orchestration.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use ignore::WalkBuilder;
use log::debug;
use regex::Regex;

use crate::config;
use crate::frontmatter::{
    extract_frontmatter, myst_to_quarto_frontmatter, quarto_to_myst_frontmatter,
    replace_frontmatter,
};
use crate::transforms::myst_to_quarto::convert_myst_to_quarto;
use crate::transforms::quarto_to_myst::convert_quarto_to_myst;

/// Conversion direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    MystToQuarto,
    QuartoToMyst,
}

/// Result of converting a single file.
#[derive(Debug)]
pub struct ConversionResult {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub skipped: bool,
    pub dry_run: bool,
}

impl ConversionResult {
    fn new(input_path: &Path, output_path: Option<PathBuf>, dry_run: bool) -> Self {
        ConversionResult {
            input_path: input_path.to_path_buf(),
            output_path,
            warnings: Vec::new(),
            errors: Vec::new(),
            skipped: false,
            dry_run,
        }
    }
}

/// Options for a directory conversion run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConvertOptions {
    /// Overwrite source files instead of writing to an output directory.
    pub in_place: bool,
    /// Only convert config files.
    pub config_only: bool,
    /// Skip config file conversion.
    pub no_config: bool,
    /// Compute everything but write nothing.
    pub dry_run: bool,
}

const MYST_CONFIG: &str = "myst.yml";
const QUARTO_CONFIG: &str = "_quarto.yml";

/// Directories never descended into during discovery or asset copying.
const SKIP_DIRS: [&str; 12] = [
    "_build",
    ".git",
    ".hg",
    "__pycache__",
    "node_modules",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "_site",
    ".quarto",
];

// Warning comments left in transformed output by the directive transforms.
static WARNING_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!-- WARNING: (.+?) -->").unwrap());

fn walker(directory: &Path) -> ignore::Walk {
    WalkBuilder::new(directory)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let name = entry.file_name().to_string_lossy();
            !(is_dir && SKIP_DIRS.contains(&name.as_ref()))
        })
        .build()
}

/// Find all convertible files under a directory: markdown sources for the
/// direction plus its project config file. Results are sorted for
/// deterministic processing order.
pub fn discover_files(directory: &Path, direction: Direction) -> Vec<PathBuf> {
    let (extension, config_name) = match direction {
        Direction::MystToQuarto => ("md", MYST_CONFIG),
        Direction::QuartoToMyst => ("qmd", QUARTO_CONFIG),
    };

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in walker(directory).flatten() {
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let matches_extension = path.extension().and_then(|e| e.to_str()) == Some(extension);
        let matches_config = path.file_name().and_then(|n| n.to_str()) == Some(config_name);
        if matches_extension || matches_config {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}

/// Convert a single markdown file: frontmatter remap plus body transform.
/// Read and write failures are recorded on the result, not propagated.
pub fn convert_file(
    input_path: &Path,
    output_path: &Path,
    direction: Direction,
    dry_run: bool,
) -> ConversionResult {
    let mut result = ConversionResult::new(input_path, Some(output_path.to_path_buf()), dry_run);

    let text = match fs::read_to_string(input_path) {
        Ok(text) => text,
        Err(e) => {
            result
                .errors
                .push(format!("Could not read {}: {e}", input_path.display()));
            return result;
        }
    };

    let (fm, body) = extract_frontmatter(&text);
    let new_fm = fm.map(|fm| match direction {
        Direction::MystToQuarto => myst_to_quarto_frontmatter(&fm),
        Direction::QuartoToMyst => quarto_to_myst_frontmatter(&fm),
    });

    let transformed_body = match direction {
        Direction::MystToQuarto => convert_myst_to_quarto(&body),
        Direction::QuartoToMyst => convert_quarto_to_myst(&body),
    };

    for captures in WARNING_COMMENT.captures_iter(&transformed_body) {
        result
            .warnings
            .push(format!("{}: {}", input_path.display(), &captures[1]));
    }

    let output_text = match new_fm {
        Some(fm) if !fm.is_empty() => replace_frontmatter(&transformed_body, &fm),
        _ => transformed_body,
    };

    if !dry_run {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent) {
                    result
                        .errors
                        .push(format!("Could not write {}: {e}", output_path.display()));
                    return result;
                }
            }
        }
        if let Err(e) = fs::write(output_path, output_text) {
            result
                .errors
                .push(format!("Could not write {}: {e}", output_path.display()));
        }
    }

    result
}

fn swap_extension(path: &Path, direction: Direction) -> PathBuf {
    let swapped = match (direction, path.extension().and_then(|e| e.to_str())) {
        (Direction::MystToQuarto, Some("md")) => Some("qmd"),
        (Direction::QuartoToMyst, Some("qmd")) => Some("md"),
        _ => None,
    };
    match swapped {
        Some(ext) => path.with_extension(ext),
        None => path.to_path_buf(),
    }
}

fn output_path_for(
    input_path: &Path,
    input_dir: &Path,
    output_dir: &Path,
    direction: Direction,
) -> PathBuf {
    let rel = input_path.strip_prefix(input_dir).unwrap_or(input_path);
    swap_extension(&output_dir.join(rel), direction)
}

/// Default output directory: the input directory name with a direction
/// suffix appended.
pub fn default_output_dir(input_dir: &Path, direction: Direction) -> PathBuf {
    let suffix = match direction {
        Direction::MystToQuarto => "-quarto",
        Direction::QuartoToMyst => "-myst",
    };
    let base = input_dir.to_string_lossy();
    PathBuf::from(format!("{}{suffix}", base.trim_end_matches('/')))
}

/// Convert a directory tree (or a single file path).
///
/// Config files convert first, then markdown sources, then non-markdown
/// assets are copied across without clobbering. With `in_place` the
/// originals are replaced; the old `.md`/`.qmd` file is removed once its
/// renamed counterpart has been written.
pub fn convert_directory(
    input_dir: &Path,
    output_dir: Option<&Path>,
    direction: Direction,
    options: ConvertOptions,
) -> io::Result<Vec<ConversionResult>> {
    if input_dir.is_file() {
        return convert_single_file_path(input_dir, output_dir, direction, options.dry_run);
    }

    let effective_output_dir = if options.in_place {
        input_dir.to_path_buf()
    } else {
        match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_output_dir(input_dir, direction),
        }
    };

    if !options.dry_run {
        fs::create_dir_all(&effective_output_dir)?;
    }

    let all_files = discover_files(input_dir, direction);
    debug!(
        "discovered {} file(s) under {}",
        all_files.len(),
        input_dir.display()
    );

    let config_name = match direction {
        Direction::MystToQuarto => MYST_CONFIG,
        Direction::QuartoToMyst => QUARTO_CONFIG,
    };
    let is_config =
        |p: &Path| p.file_name().and_then(|n| n.to_str()) == Some(config_name);

    let mut results: Vec<ConversionResult> = Vec::new();

    if !options.no_config {
        for config_path in all_files.iter().filter(|p| is_config(p)) {
            results.push(convert_config_file(
                config_path,
                &effective_output_dir,
                direction,
                options.dry_run,
            ));
        }
    }

    if !options.config_only {
        for md_path in all_files.iter().filter(|p| !is_config(p)) {
            let out_path = output_path_for(md_path, input_dir, &effective_output_dir, direction);
            let md_result = convert_file(md_path, &out_path, direction, options.dry_run);
            let clean = md_result.errors.is_empty();
            results.push(md_result);

            if options.in_place && !options.dry_run && clean && *md_path != out_path {
                let _ = fs::remove_file(md_path);
            }
        }
    }

    if !options.in_place && !options.dry_run && !options.config_only {
        copy_assets(input_dir, &effective_output_dir)?;
    }

    Ok(results)
}

fn convert_single_file_path(
    file_path: &Path,
    output_dir: Option<&Path>,
    direction: Direction,
    dry_run: bool,
) -> io::Result<Vec<ConversionResult>> {
    let parent = file_path.parent().unwrap_or_else(|| Path::new("."));
    let output_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_output_dir(parent, direction),
    };

    if !dry_run {
        fs::create_dir_all(&output_dir)?;
    }

    let file_name = file_path.file_name().unwrap_or_default();
    let out_path = swap_extension(&output_dir.join(file_name), direction);
    Ok(vec![convert_file(file_path, &out_path, direction, dry_run)])
}

/// Copy non-markdown assets (bibliographies, images, static files) into
/// the output tree, never overwriting existing files.
fn copy_assets(input_dir: &Path, output_dir: &Path) -> io::Result<()> {
    for entry in walker(input_dir).flatten() {
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let src = entry.path();
        let ext = src.extension().and_then(|e| e.to_str());
        if matches!(ext, Some("md") | Some("qmd")) {
            continue;
        }
        let name = src.file_name().and_then(|n| n.to_str());
        if matches!(name, Some(MYST_CONFIG) | Some(QUARTO_CONFIG)) {
            continue;
        }

        let rel = src.strip_prefix(input_dir).unwrap_or(src);
        let dst = output_dir.join(rel);
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        if !dst.exists() {
            fs::copy(src, &dst)?;
        }
    }
    Ok(())
}

fn convert_config_file(
    config_path: &Path,
    output_dir: &Path,
    direction: Direction,
    dry_run: bool,
) -> ConversionResult {
    let mut result = ConversionResult::new(config_path, None, dry_run);

    if dry_run {
        let out_name = match direction {
            Direction::MystToQuarto => QUARTO_CONFIG,
            Direction::QuartoToMyst => MYST_CONFIG,
        };
        result.output_path = Some(output_dir.join(out_name));
        return result;
    }

    if let Err(e) = fs::create_dir_all(output_dir) {
        result.errors.push(format!("Config conversion failed: {e}"));
        return result;
    }

    let converted = match direction {
        Direction::MystToQuarto => config::convert_myst_config(config_path, output_dir),
        Direction::QuartoToMyst => config::convert_quarto_config(config_path, output_dir),
    };

    match converted {
        Ok(out_path) => result.output_path = Some(out_path),
        Err(e) => result.errors.push(format!("Config conversion failed: {e}")),
    }

    result
}
