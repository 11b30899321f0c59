//! Bidirectional converter between MyST markdown and Quarto markdown.
//!
//! The forward direction ([`convert_myst_to_quarto`]) runs a stack-based
//! directive scanner over MyST fences and rewrites them as Quarto
//! constructs; the reverse direction ([`convert_quarto_to_myst`]) detects
//! Quarto's flatter constructs line by line. [`convert_directory`] wires
//! both into project-level conversion with frontmatter and config
//! remapping.

pub mod config;
pub mod convert;
pub mod fence;
pub mod frontmatter;
pub mod scanner;
pub mod transforms;
pub mod warnings;

pub use config::{
    convert_myst_config, convert_quarto_config, myst_to_quarto_config, quarto_to_myst_config,
    ConfigError,
};
pub use convert::{
    convert_directory, convert_file, discover_files, ConversionResult, ConvertOptions, Direction,
};
pub use frontmatter::{
    extract_frontmatter, myst_to_quarto_frontmatter, quarto_to_myst_frontmatter,
    replace_frontmatter,
};
pub use scanner::{DirectiveFrame, Scanner};
pub use transforms::myst_to_quarto::{
    convert_myst_to_quarto, transform_directive, transform_inline as transform_myst_inline,
};
pub use transforms::quarto_to_myst::{
    build_admonition, build_code_cell, build_figure_directive, build_image_directive,
    build_margin, build_math_directive, build_tab_set, build_table_directive,
    convert_quarto_to_myst, transform_quarto_inline,
};
pub use warnings::WarningCollector;
