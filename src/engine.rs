//! Retrieval-augmented query engine.
//!
//! The engine owns the vector store and the loaded-document registry, and
//! coordinates one query end to end: empty-store guard, answer-language
//! detection, retrieval, context and prompt assembly, completion call.
//!
//! Conversation state stays outside: `answer` reads the history it is
//! given and never appends to it, so the caller decides whether a turn is
//! persisted or discarded.
//!
//! The engine is single-threaded by construction — every mutating
//! operation takes `&mut self`, so an insert or clear can never overlap a
//! query on the same instance.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cache::VectorCache;
use crate::chat::ChatModel;
use crate::chunk::ChunkParams;
use crate::embedding::Embedder;
use crate::ingest::{self, BatchReport, LoadOutcome, LoadReport};
use crate::lang::detect_answer_language;
use crate::models::Turn;
use crate::prompt::{self, PromptInputs};
use crate::reader;
use crate::store::VectorStore;

/// Returned by [`QueryEngine::answer`] when no documents have been loaded.
/// A designed guidance response, not an error.
pub const NO_DOCUMENTS_MESSAGE: &str =
    "로드된 문서가 없습니다. 먼저 문서를 로드해주세요.";

pub struct QueryEngine {
    store: VectorStore,
    loaded_files: Vec<String>,
    embedder: Box<dyn Embedder>,
    chat: Box<dyn ChatModel>,
    cache: Option<VectorCache>,
    chunking: ChunkParams,
    top_k: usize,
}

impl QueryEngine {
    pub fn new(
        embedder: Box<dyn Embedder>,
        chat: Box<dyn ChatModel>,
        chunking: ChunkParams,
        top_k: usize,
        cache: Option<VectorCache>,
    ) -> Self {
        Self {
            store: VectorStore::new(),
            loaded_files: Vec::new(),
            embedder,
            chat,
            cache,
            chunking,
            top_k,
        }
    }

    /// Swap the completion binding.
    ///
    /// Must be called after a model or temperature change — the old
    /// binding keeps its construction-time settings.
    pub fn rebind_chat(&mut self, chat: Box<dyn ChatModel>) {
        self.chat = chat;
    }

    /// Loaded-document registry: insertion order, no duplicate names.
    pub fn loaded_files(&self) -> &[String] {
        &self.loaded_files
    }

    pub fn has_documents(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.store.len()
    }

    /// Load one document: read, chunk, embed, merge into the store.
    ///
    /// Returns the number of chunks produced. On failure nothing is
    /// inserted and the registry is untouched.
    pub async fn load_document(&mut self, path: &Path) -> Result<usize> {
        let chunks = ingest::ingest_file(
            path,
            &self.chunking,
            self.embedder.as_ref(),
            self.cache.as_ref(),
        )
        .await?;

        let count = chunks.len();
        let name = reader::display_name(path);
        self.store.insert(chunks);
        if !self.loaded_files.contains(&name) {
            self.loaded_files.push(name);
        }
        Ok(count)
    }

    /// Load a batch of documents, each independently.
    ///
    /// A failing document is reported in its slot and never aborts the
    /// rest; chunks from documents loaded earlier in the batch stay in the
    /// store. Per-document results keep input order.
    pub async fn load_documents(&mut self, paths: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();

        for path in paths {
            let source_file = reader::display_name(path);
            let outcome = match self.load_document(path).await {
                Ok(chunks) => {
                    report.total_chunks += chunks;
                    LoadOutcome::Loaded { chunks }
                }
                Err(e) => LoadOutcome::Failed {
                    error: format!("{:#}", e),
                },
            };
            report.documents.push(LoadReport {
                source_file,
                outcome,
            });
        }

        report
    }

    /// Reset the store and the registry together.
    pub fn clear_documents(&mut self) {
        self.store.clear();
        self.loaded_files.clear();
    }

    /// Answer a question against the loaded documents and the given
    /// conversation history.
    ///
    /// The caller appends the question and the returned response to its
    /// history; the engine never mutates conversation state.
    pub async fn answer(&self, question: &str, history: &[Turn]) -> Result<String> {
        if self.store.is_empty() {
            return Ok(NO_DOCUMENTS_MESSAGE.to_string());
        }

        let answer_language = detect_answer_language(question);

        let query_vector = self.embedder.embed_query(question).await?;
        let hits = self.store.query(&query_vector, self.top_k);

        let context = prompt::format_context(&hits);
        let file_summary = prompt::summarize_files(&self.loaded_files);

        let assembled = prompt::build_prompt(&PromptInputs {
            question,
            context: &context,
            history,
            file_summary: &file_summary,
            answer_language,
        });

        self.chat.complete(&assembled).await
    }
}
