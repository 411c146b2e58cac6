use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentConfig {
    /// The single PDF this instance answers questions about.
    #[serde(default = "default_pdf_path")]
    pub pdf_path: PathBuf,
    /// Cached page text, written after the first successful extraction.
    #[serde(default = "default_pages_path")]
    pub pages_path: PathBuf,
    /// Page acquisition engine: `ocr` (tesseract) or `text` (embedded text layer).
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Rendering resolution for OCR rasterization.
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            pdf_path: default_pdf_path(),
            pages_path: default_pages_path(),
            engine: default_engine(),
            dpi: default_dpi(),
        }
    }
}

fn default_pdf_path() -> PathBuf {
    PathBuf::from("data/document.pdf")
}
fn default_pages_path() -> PathBuf {
    PathBuf::from("out/ocr_all.json")
}
fn default_engine() -> String {
    "ocr".to_string()
}
fn default_dpi() -> u32 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    800
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_bundle_dir")]
    pub bundle_dir: PathBuf,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            bundle_dir: default_bundle_dir(),
        }
    }
}

fn default_top_k() -> usize {
    3
}
fn default_bundle_dir() -> PathBuf {
    PathBuf::from("out/index")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `local` (fastembed), `hash` (deterministic offline), or `disabled`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Vector dimensionality. Defaults per model for `local`; required
    /// to be > 0 for `hash`.
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dims: None,
            batch_size: default_batch_size(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_model() -> String {
    "all-minilm-l6-v2".to_string()
}
fn default_batch_size() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    #[serde(default = "default_answer_model")]
    pub model: String,
    /// Gemini API key. Filled from `GOOGLE_API_KEY` at load time when absent;
    /// immutable afterward.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            model: default_answer_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_answer_model() -> String {
    "gemini-2.5-pro".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // The only environment read happens here, once; the rest of the program
    // sees an immutable Config.
    if config.answer.api_key.is_none() {
        config.answer.api_key = std::env::var("GOOGLE_API_KEY").ok();
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }

    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    match config.document.engine.as_str() {
        "ocr" | "text" => {}
        other => anyhow::bail!(
            "Unknown document engine: '{}'. Must be ocr or text.",
            other
        ),
    }

    match config.embedding.provider.as_str() {
        "local" | "hash" | "disabled" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be local, hash, or disabled.",
            other
        ),
    }

    if config.embedding.provider == "hash" && config.embedding.dims == Some(0) {
        anyhow::bail!("embedding.dims must be > 0 for the hash provider");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.bundle_dir, PathBuf::from("out/index"));
        assert_eq!(config.embedding.model, "all-minilm-l6-v2");
        assert_eq!(config.document.dpi, 300);
        validate(&config).unwrap();
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let config: Config = toml::from_str("[chunking]\nchunk_size = 0").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_top_k() {
        let config: Config = toml::from_str("[retrieval]\ntop_k = 0").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let config: Config = toml::from_str("[embedding]\nprovider = \"faiss\"").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_unknown_engine() {
        let config: Config = toml::from_str("[document]\nengine = \"vision\"").unwrap();
        assert!(validate(&config).is_err());
    }
}
