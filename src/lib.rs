//! # docchat
//!
//! Retrieval-augmented question answering over a single PDF document.
//!
//! docchat extracts a PDF's text (OCR or embedded text layer), splits it into
//! page-tagged chunks, embeds the chunks into dense vectors, and serves
//! nearest-neighbor retrieval over them. At query time the top-matching
//! chunks ground a generative-model answer that cites pages.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────────┐   ┌─────────────┐
//! │  pages   │──▶│    pipeline      │──▶│   bundle    │
//! │ OCR/text │   │ chunk + embed   │   │ index+meta  │
//! └──────────┘   └─────────────────┘   └─────┬───────┘
//!                                            │
//!                            ┌───────────────┤
//!                            ▼               ▼
//!                      ┌──────────┐    ┌──────────┐
//!                      │  search  │    │ ask/chat │
//!                      └──────────┘    └──────────┘
//! ```
//!
//! ## Quick start
//!
//! ```bash
//! docchat build                 # OCR the PDF and build the index bundle
//! docchat search "warranty"     # show ranked evidence without the model
//! docchat ask "What is covered by the warranty?"
//! docchat chat                  # interactive REPL
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`pages`] | Page acquisition (OCR / text layer / cache) |
//! | [`chunker`] | Fixed-window page-tagged chunking |
//! | [`embedding`] | Embedder trait and providers |
//! | [`index`] | Brute-force L2 nearest-neighbor index |
//! | [`store`] | Bundle persistence |
//! | [`build`] | Build pipeline orchestration |
//! | [`retrieve`] | Query-time retrieval |
//! | [`answer`] | Gemini answer collaborator |
//! | [`qa`] | ask / chat commands |

pub mod answer;
pub mod build;
pub mod chunker;
pub mod config;
pub mod embedding;
pub mod index;
pub mod models;
pub mod pages;
pub mod progress;
pub mod qa;
pub mod retrieve;
pub mod store;
