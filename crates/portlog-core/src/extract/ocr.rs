use std::path::{Path, PathBuf};
use std::process::Command;

use super::{BackendError, BackendResult};

/// Renders a single PDF page (1-based) to PNG bytes.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf_path: &Path, page: usize) -> BackendResult<Vec<u8>>;
}

/// Turns a page image into text.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8]) -> BackendResult<String>;
}

fn locate(binary: &str) -> BackendResult<PathBuf> {
    which::which(binary).map_err(|_| BackendError::new(format!("{binary} not found on PATH")))
}

fn run(mut cmd: Command, binary: &str) -> BackendResult<Vec<u8>> {
    let output = cmd
        .output()
        .map_err(|e| BackendError::new(format!("failed to run {binary}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BackendError::new(format!(
            "{binary} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}

/// Rasterizer shelling out to poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
}

impl PdftoppmRasterizer {
    #[must_use]
    pub fn new(binary: impl Into<String>, dpi: u32) -> Self {
        Self {
            binary: binary.into(),
            dpi,
        }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm", 300)
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf_path: &Path, page: usize) -> BackendResult<Vec<u8>> {
        let binary = locate(&self.binary)?;
        let scratch = tempfile::tempdir()?;
        let prefix = scratch.path().join("page");
        let page = page.to_string();

        let mut cmd = Command::new(binary);
        cmd.arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(&page)
            .arg("-l")
            .arg(&page)
            .arg("-singlefile")
            .arg(pdf_path)
            .arg(&prefix);
        run(cmd, &self.binary)?;

        Ok(std::fs::read(prefix.with_extension("png"))?)
    }
}

/// OCR engine shelling out to the `tesseract` CLI.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: String,
    languages: String,
}

impl TesseractOcr {
    #[must_use]
    pub fn new(binary: impl Into<String>, languages: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
        }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new("tesseract", "eng")
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image: &[u8]) -> BackendResult<String> {
        let binary = locate(&self.binary)?;
        let input = tempfile::Builder::new().suffix(".png").tempfile()?;
        std::fs::write(input.path(), image)?;

        let mut cmd = Command::new(binary);
        cmd.arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages);
        let stdout = run(cmd, &self.binary)?;

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}
