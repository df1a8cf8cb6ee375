//! PDF encryption via `qpdf`.
//!
//! Output is AES-256 with the same user and owner password. Printing is
//! allowed; modification and extraction are not.

use std::path::{Path, PathBuf};
use std::process::Output;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// qpdf exit code for "succeeded with warnings".
const QPDF_EXIT_WARNINGS: i32 = 3;

/// Errors from PDF encryption.
#[derive(Debug, Error)]
pub enum EncryptError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("qpdf encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes a password-protected copy of a PDF.
#[async_trait]
pub trait PdfEncryptor: Send + Sync {
    /// Encrypt `input` into `output` with `password`.
    async fn encrypt(&self, input: &Path, output: &Path, password: &str)
        -> Result<(), EncryptError>;
}

/// Encryptor backed by the `qpdf` command-line tool.
pub struct QpdfEncryptor {
    binary: PathBuf,
}

impl QpdfEncryptor {
    /// Use a specific `qpdf` binary.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Locate `qpdf`: configured path, then a copy bundled next to the
    /// executable, then PATH.
    pub fn discover(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            return Self::new(path);
        }
        if let Some(path) = bundled_qpdf() {
            tracing::debug!("Using bundled qpdf at {}", path.display());
            return Self::new(path);
        }
        Self::new(which::which("qpdf").unwrap_or_else(|_| PathBuf::from("qpdf")))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn args<'a>(input: &'a Path, output: &'a Path, password: &'a str) -> Vec<&'a std::ffi::OsStr> {
        let mut args: Vec<&std::ffi::OsStr> = [
            "--encrypt",
            password,
            password,
            "256",
            "--modify=none",
            "--extract=n",
            "--print=full",
            "--",
        ]
        .iter()
        .map(|s| std::ffi::OsStr::new(*s))
        .collect();
        args.push(input.as_os_str());
        args.push(output.as_os_str());
        args
    }
}

/// `qpdf/win/qpdf.exe` or `qpdf/mac/qpdf` beside the running executable.
fn bundled_qpdf() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let base = exe.parent()?;
    [
        base.join("qpdf").join("win").join("qpdf.exe"),
        base.join("qpdf").join("mac").join("qpdf"),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

#[async_trait]
impl PdfEncryptor for QpdfEncryptor {
    async fn encrypt(
        &self,
        input: &Path,
        output: &Path,
        password: &str,
    ) -> Result<(), EncryptError> {
        let result = Command::new(&self.binary)
            .args(Self::args(input, output, password))
            .output()
            .await;

        match result {
            Ok(out) => exit_result(&out, input),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EncryptError::ToolNotFound(
                "qpdf (install qpdf)".to_string(),
            )),
            Err(e) => Err(EncryptError::Io(e)),
        }
    }
}

/// Map a finished qpdf run to success or an encryption error.
fn exit_result(out: &Output, input: &Path) -> Result<(), EncryptError> {
    if out.status.success() {
        return Ok(());
    }
    // Exit 3 is success with warnings; qpdf has still written the output
    if out.status.code() == Some(QPDF_EXIT_WARNINGS) {
        tracing::warn!(
            "qpdf reported warnings for {}: {}",
            input.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        );
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&out.stderr);
    let message = if stderr.trim().is_empty() {
        format!("qpdf exited with {}", out.status)
    } else {
        stderr.trim().to_string()
    };
    Err(EncryptError::EncryptionFailed(message))
}

/// Output path for the protected copy: `<stem>_protected.pdf` in `output_dir`.
pub fn protected_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    // The input extension is replaced, not appended to: `scan.PDF` becomes `scan_protected.pdf`
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    output_dir.join(format!("{}_protected.pdf", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_output_path() {
        assert_eq!(
            protected_output_path(Path::new("/in/jane doe.pdf"), Path::new("/out")),
            PathBuf::from("/out/jane doe_protected.pdf")
        );
        assert_eq!(
            protected_output_path(Path::new("/in/scan.PDF"), Path::new("/in")),
            PathBuf::from("/in/scan_protected.pdf")
        );
    }

    #[test]
    fn test_args_order() {
        let args = QpdfEncryptor::args(Path::new("in.pdf"), Path::new("out.pdf"), "01022015");
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(
            args,
            vec![
                "--encrypt",
                "01022015",
                "01022015",
                "256",
                "--modify=none",
                "--extract=n",
                "--print=full",
                "--",
                "in.pdf",
                "out.pdf"
            ]
        );
    }

    #[test]
    fn test_configured_binary_wins() {
        let encryptor = QpdfEncryptor::discover(Some(Path::new("/opt/qpdf/bin/qpdf")));
        assert_eq!(encryptor.binary(), Path::new("/opt/qpdf/bin/qpdf"));
    }

    #[cfg(unix)]
    fn output(code: i32, stderr: &str) -> Output {
        use std::os::unix::process::ExitStatusExt;
        Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_exit_codes() {
        let input = Path::new("in.pdf");
        assert!(exit_result(&output(0, ""), input).is_ok());
        assert!(exit_result(&output(3, "WARNING: damaged xref"), input).is_ok());

        let err = exit_result(&output(2, "in.pdf: not a PDF file\n"), input).unwrap_err();
        assert_eq!(err.to_string(), "qpdf encryption failed: in.pdf: not a PDF file");

        let err = exit_result(&output(1, ""), input).unwrap_err();
        assert!(err.to_string().starts_with("qpdf encryption failed: qpdf exited with"));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let encryptor = QpdfEncryptor::new("doblock-no-such-qpdf");
        let result = encryptor
            .encrypt(Path::new("in.pdf"), Path::new("out.pdf"), "pw")
            .await;
        assert!(matches!(result, Err(EncryptError::ToolNotFound(_))));
    }
}
