//! Core types for the publications assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Document and fragment types shared by ingestion, retrieval, and
//!   prompt assembly
//! - Error types

pub mod document;
pub mod error;

pub use document::{Document, Fragment};
pub use error::{Error, Result};
