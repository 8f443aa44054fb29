//! # reportal-core
//!
//! Core crate for Reportal. Contains the layered configuration schema
//! and the unified error system shared by every other crate.
//!
//! This crate has **no** internal dependencies on other Reportal crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
