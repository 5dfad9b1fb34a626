//! Conversion between canonical types and vendor wire formats
//!
//! Each submodule also holds the stream decoder for its vendor.

pub mod anthropic;
pub mod google;
pub mod openai;
