//! Shared utility functions.
//!
//! - `html`: HTML escaping and match highlighting for reports

mod html;

pub use html::{highlight_match, html_escape};
