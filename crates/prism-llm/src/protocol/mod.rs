//! Wire format types for vendor APIs
//!
//! Pure serde structs matching each vendor's JSON. They appear only at the
//! conversion boundary.

pub mod anthropic;
pub mod google;
pub mod openai;
