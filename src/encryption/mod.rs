//! Password protection of PDFs through an external encryptor.

mod qpdf;

pub use qpdf::{protected_output_path, EncryptError, PdfEncryptor, QpdfEncryptor};
