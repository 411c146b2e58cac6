//! Page acquisition: turning a PDF into an ordered sequence of [`Page`]s.
//!
//! This is the OCR collaborator's narrow interface — the retrieval core never
//! inspects PDF structure or images. Two engines:
//!
//! - **`ocr`** — rasterize with `pdftoppm`, recognize with `tesseract`. Both
//!   are external binaries; their absence is reported up front with install
//!   hints, not discovered mid-run.
//! - **`text`** — read the embedded text layer per page with lopdf, for
//!   born-digital PDFs that need no OCR.
//!
//! Extracted pages are cached as a JSON array (`[{"page": 1, "text": ...}]`)
//! so repeated builds skip the expensive extraction step.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::Command;

use crate::config::DocumentConfig;
use crate::models::Page;
use crate::progress::{BuildProgressEvent, BuildProgressReporter};

/// Load previously extracted pages from the JSON cache.
pub fn load_cached_pages(path: &Path) -> Result<Vec<Page>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read page cache: {}", path.display()))?;
    let pages: Vec<Page> = serde_json::from_slice(&bytes)
        .with_context(|| format!("Page cache is not valid JSON: {}", path.display()))?;
    Ok(pages)
}

/// Write pages to the JSON cache, creating parent directories as needed.
pub fn save_pages(path: &Path, pages: &[Page]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(pages)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write page cache: {}", path.display()))?;
    Ok(())
}

/// Extract pages from the configured PDF using the configured engine.
pub fn acquire_pages(
    config: &DocumentConfig,
    progress: &dyn BuildProgressReporter,
) -> Result<Vec<Page>> {
    if !config.pdf_path.exists() {
        bail!("PDF not found: {}", config.pdf_path.display());
    }

    match config.engine.as_str() {
        "ocr" => ocr_pages(&config.pdf_path, config.dpi, progress),
        "text" => text_layer_pages(&config.pdf_path),
        other => bail!("Unknown document engine: '{}'", other),
    }
}

/// Rasterize the PDF and OCR each page image.
fn ocr_pages(
    pdf: &Path,
    dpi: u32,
    progress: &dyn BuildProgressReporter,
) -> Result<Vec<Page>> {
    require_binary("pdftoppm", "poppler-utils (brew install poppler)")?;
    require_binary("tesseract", "tesseract-ocr (brew install tesseract)")?;

    let tmp = tempfile::TempDir::new()?;
    let prefix = tmp.path().join("page");

    let output = Command::new("pdftoppm")
        .arg("-r")
        .arg(dpi.to_string())
        .arg("-png")
        .arg(pdf)
        .arg(&prefix)
        .output()
        .context("Failed to run pdftoppm")?;
    if !output.status.success() {
        bail!(
            "pdftoppm failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    // pdftoppm names images page-1.png, page-2.png (zero-padded for 10+
    // pages); sort numerically, not lexically.
    let mut images: Vec<(u32, std::path::PathBuf)> = std::fs::read_dir(tmp.path())?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let number = page_number_from_filename(path.file_name()?.to_str()?)?;
            Some((number, path))
        })
        .collect();
    images.sort_by_key(|(n, _)| *n);

    if images.is_empty() {
        bail!("pdftoppm produced no page images for {}", pdf.display());
    }

    let total = images.len() as u64;
    let mut pages = Vec::with_capacity(images.len());

    for (i, (_, image)) in images.iter().enumerate() {
        let output = Command::new("tesseract")
            .arg(image)
            .arg("stdout")
            .output()
            .context("Failed to run tesseract")?;
        if !output.status.success() {
            bail!(
                "tesseract failed on page {}: {}",
                i + 1,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        pages.push(Page {
            page: (i + 1) as u32,
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
        });
        progress.report(BuildProgressEvent::Ocr {
            page: (i + 1) as u64,
            total,
        });
    }

    Ok(pages)
}

/// Read the embedded text layer, one entry per physical page.
fn text_layer_pages(pdf: &Path) -> Result<Vec<Page>> {
    let doc = lopdf::Document::load(pdf)
        .with_context(|| format!("Failed to parse PDF: {}", pdf.display()))?;

    let mut pages = Vec::new();
    for (page_number, _object_id) in doc.get_pages() {
        // A page whose content stream defeats extraction still occupies its
        // slot in the sequence.
        let text = doc.extract_text(&[page_number]).unwrap_or_default();
        pages.push(Page {
            page: page_number,
            text,
        });
    }

    if pages.is_empty() {
        bail!("PDF has no pages: {}", pdf.display());
    }

    Ok(pages)
}

/// Parse the page number out of a `page-N.png` filename.
fn page_number_from_filename(name: &str) -> Option<u32> {
    name.strip_suffix(".png")?
        .rsplit('-')
        .next()?
        .parse()
        .ok()
}

/// Fail early with an install hint when a required binary is not on PATH.
fn require_binary(name: &str, hint: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            bail!("Required binary '{}' not found on PATH. Install {}.", name, hint)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to probe binary '{}'", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_number_parsing() {
        assert_eq!(page_number_from_filename("page-1.png"), Some(1));
        assert_eq!(page_number_from_filename("page-07.png"), Some(7));
        assert_eq!(page_number_from_filename("page-120.png"), Some(120));
        assert_eq!(page_number_from_filename("page-1.txt"), None);
        assert_eq!(page_number_from_filename("cover.png"), None);
    }

    #[test]
    fn test_page_cache_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("ocr_all.json");
        let pages = vec![
            Page {
                page: 1,
                text: "first page text".to_string(),
            },
            Page {
                page: 2,
                text: "second page text".to_string(),
            },
        ];

        save_pages(&path, &pages).unwrap();
        let loaded = load_cached_pages(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].page, 1);
        assert_eq!(loaded[1].text, "second page text");
    }

    #[test]
    fn test_cache_accepts_original_layout() {
        // The cache shape matches the historical ocr_all.json layout.
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ocr_all.json");
        std::fs::write(&path, br#"[{"page": 1, "text": "hello"}]"#).unwrap();
        let loaded = load_cached_pages(&path).unwrap();
        assert_eq!(loaded[0].page, 1);
        assert_eq!(loaded[0].text, "hello");
    }

    #[test]
    fn test_missing_cache_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(load_cached_pages(&tmp.path().join("nope.json")).is_err());
    }
}
