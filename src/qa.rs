//! Question answering: the `ask` one-shot command and the `chat` REPL.
//!
//! This is the UI layer that consumes the retrieval core and the answer
//! collaborator. It is the only place allowed to render a degraded answer:
//! when the model is unavailable, the user sees the reason plus a truncated
//! excerpt of the retrieved context instead of a crash.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};

use crate::answer::{self, AnswerOutcome, GeminiClient};
use crate::config::Config;
use crate::embedding::{self, Embedder};
use crate::retrieve;
use crate::store::{self, IndexBundle};

/// Characters of context shown when falling back without a model answer.
const FALLBACK_EXCERPT_CHARS: usize = 1000;

/// Body of `docchat ask`: one question, one answer, exit.
pub fn run_ask(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    let session = QaSession::open(config)?;
    let k = top_k.unwrap_or(config.retrieval.top_k);
    println!("{}", session.answer(question, k));
    Ok(())
}

/// Body of `docchat chat`: interactive loop, exits on EOF.
pub fn run_chat(config: &Config) -> Result<()> {
    let session = QaSession::open(config)?;
    let k = config.retrieval.top_k;

    println!("Ready. Ask questions about your PDF (Ctrl-D to quit).");

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nQ: ");
        std::io::stdout().flush()?;

        let question = match lines.next() {
            Some(line) => line?,
            None => {
                println!("\nBye.");
                break;
            }
        };
        let question = question.trim();
        if question.is_empty() {
            continue;
        }

        println!("\nA: {}", session.answer(question, k));
    }

    Ok(())
}

/// One loaded bundle plus the collaborators needed to answer questions.
///
/// The bundle is loaded once and read-only thereafter; every question reuses
/// it. A missing API key is remembered as a reason rather than an error so
/// retrieval still works and the fallback can render.
struct QaSession {
    embedder: Box<dyn Embedder>,
    bundle: IndexBundle,
    client: std::result::Result<GeminiClient, String>,
}

impl QaSession {
    fn open(config: &Config) -> Result<Self> {
        let embedder = embedding::create_embedder(&config.embedding)?;
        let bundle = store::load(&config.retrieval.bundle_dir).with_context(|| {
            format!(
                "no usable bundle under {} (run `docchat build` first)",
                config.retrieval.bundle_dir.display()
            )
        })?;
        let client = GeminiClient::new(&config.answer).map_err(|e| e.to_string());

        Ok(Self {
            embedder,
            bundle,
            client,
        })
    }

    fn answer(&self, question: &str, k: usize) -> String {
        let hits = match retrieve::retrieve(self.embedder.as_ref(), &self.bundle, question, k) {
            Ok(hits) => hits,
            Err(e) => return format!("retrieval failed: {}", e),
        };
        if hits.is_empty() {
            return "No matching passages found in the document.".to_string();
        }

        let context = answer::build_context(&hits);
        let outcome = match &self.client {
            Ok(client) => client.ask(&context, question),
            Err(reason) => AnswerOutcome::Unavailable(reason.clone()),
        };
        render_outcome(outcome, &context)
    }
}

/// Render an answer outcome for the terminal. The degraded branch shows the
/// reason and a bounded context excerpt so the user still gets evidence.
fn render_outcome(outcome: AnswerOutcome, context: &str) -> String {
    match outcome {
        AnswerOutcome::Answer(text) => text,
        AnswerOutcome::Unavailable(reason) => {
            format!(
                "[answer unavailable] {}\nFALLBACK (context excerpt):\n{}",
                reason,
                truncate_chars(context, FALLBACK_EXCERPT_CHARS)
            )
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
