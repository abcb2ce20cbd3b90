//! # tcx Common Library
//!
//! Shared code for the transcript campaign extraction workspace:
//! - Error type used across crates
//! - Bootstrap configuration loading (CLI → ENV → TOML → defaults)
//! - Timestamp helpers for report artifacts

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
