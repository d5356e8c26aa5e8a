//! Presentation of summarization results.
//!
//! - [`text`]: the plain-text report printed by the `digest` command and
//!   optionally saved to disk
//! - [`json`]: the `NewsResponse` envelope returned by the HTTP service

pub mod json;
pub mod text;
