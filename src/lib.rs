//! doblock - password-protect PDFs with the date of birth on their first page.
//!
//! Page text is extracted with Poppler, a date of birth is matched against a
//! prioritized set of label patterns, and a `DDMMYYYY` password is derived
//! from it. Encrypted copies are written with qpdf.

pub mod cli;
pub mod config;
pub mod encryption;
pub mod extraction;
pub mod models;
pub mod report;
pub mod services;
pub mod utils;
