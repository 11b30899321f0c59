//! Per-direction transform tables.
//!
//! `myst_to_quarto` drives the stack-based directive scanner; the Quarto
//! dialect's constructs are not uniformly stack-nestable, so
//! `quarto_to_myst` is an independent line-oriented detector rather than a
//! mirror image.

pub mod myst_to_quarto;
pub mod quarto_to_myst;
