//! Header screenshot of page 1 for reviewers.
//!
//! Page 1 is rasterized with `pdftoppm`, the top band of the page is kept
//! and returned as a `data:image/png;base64,...` URL.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use image::ImageFormat;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;

/// Default rasterization resolution (2x the 72 DPI PDF user space).
pub const DEFAULT_RENDER_DPI: u32 = 144;

/// Default share of the page height kept from the top.
pub const DEFAULT_CROP_FRACTION: f32 = 0.25;

/// Errors from screenshot rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders the header band of page 1.
///
/// Implementations take ownership of the PDF bytes.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    /// Render page 1 and return the cropped header as a PNG data URL.
    async fn render_header(&self, pdf_data: Vec<u8>) -> Result<String, RenderError>;
}

/// Rasterizer backed by Poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    binary: PathBuf,
    dpi: u32,
    crop_fraction: f32,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            dpi: DEFAULT_RENDER_DPI,
            crop_fraction: DEFAULT_CROP_FRACTION,
        }
    }
}

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `pdftoppm` binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set render resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the share of page height kept from the top.
    pub fn with_crop_fraction(mut self, fraction: f32) -> Self {
        self.crop_fraction = fraction;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn render_header(&self, pdf_data: Vec<u8>) -> Result<String, RenderError> {
        let temp_dir = TempDir::new()?;
        let input = temp_dir.path().join("input.pdf");
        let output_prefix = temp_dir.path().join("page");
        tokio::fs::write(&input, pdf_data).await?;

        let dpi = self.dpi.to_string();
        let status = Command::new(&self.binary)
            .args(["-png", "-r", &dpi, "-f", "1", "-l", "1", "-singlefile"])
            .arg(&input)
            .arg(&output_prefix)
            .status()
            .await;

        match status {
            Ok(s) if s.success() => {}
            Ok(s) => {
                return Err(RenderError::RenderFailed(format!(
                    "pdftoppm exited with {}",
                    s
                )))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RenderError::ToolNotFound(
                    "pdftoppm (install poppler-utils)".to_string(),
                ))
            }
            Err(e) => return Err(RenderError::Io(e)),
        }

        // -singlefile writes <prefix>.png without a page suffix
        let png = tokio::fs::read(output_prefix.with_extension("png")).await?;
        let header = crop_header(&png, self.crop_fraction)?;
        Ok(png_data_url(&header))
    }
}

/// Keep the top `fraction` of an encoded image, re-encoded as PNG.
pub fn crop_header(image_data: &[u8], fraction: f32) -> Result<Vec<u8>, RenderError> {
    let page = image::load_from_memory(image_data)?;
    let band = ((page.height() as f32) * fraction).floor() as u32;
    let band = band.clamp(1, page.height());

    let header = page.crop_imm(0, 0, page.width(), band);
    let mut out = Cursor::new(Vec::new());
    header.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// Encode PNG bytes as a data URL.
pub fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(png)
    )
}
