//! Prompt assembly for the query engine.
//!
//! Everything the completion call sees is built here: the source-attributed
//! context block, the loaded-file summary, and the final structured prompt.
//! Assembly is a pure function of [`PromptInputs`] — the five late-bound
//! values (question, context, history, file summary, answer language) are
//! resolved by the engine and rendered in one place, with no template
//! engine involved.

use crate::lang::AnswerLanguage;
use crate::models::{EmbeddedChunk, Turn};

/// Late-bound values for one prompt assembly.
#[derive(Debug)]
pub struct PromptInputs<'a> {
    pub question: &'a str,
    pub context: &'a str,
    pub history: &'a [Turn],
    pub file_summary: &'a str,
    pub answer_language: AnswerLanguage,
}

/// A fully assembled prompt: system instruction, prior turns, user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub system: String,
    pub history: Vec<Turn>,
    pub user: String,
}

/// Render retrieved chunks as an attributed context block.
///
/// One block per chunk in retrieval order (nearest first), each carrying
/// its source file, separated by blank lines. No re-sorting by source.
pub fn format_context(chunks: &[&EmbeddedChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("[source: {}]\n{}", c.chunk.source_file, c.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Human-readable descriptor of the loaded-document registry.
pub fn summarize_files(files: &[String]) -> String {
    format!("{} document(s) loaded: {}", files.len(), files.join(", "))
}

/// Build the structured prompt for one completion call.
pub fn build_prompt(inputs: &PromptInputs) -> AssembledPrompt {
    let system = match inputs.answer_language {
        AnswerLanguage::Korean => format!(
            "당신은 문서 기반 AI 어시스턴트입니다. 반드시 한국어로만 답변하세요. \
             원문 문서에 다른 언어로 된 전문 용어가 있으면 번역하지 말고 그대로 유지하세요. \
             제공된 참고 문서와 대화 기록에 근거해서만 답변하고, \
             근거가 부족하면 지어내지 말고 모른다고 답하세요.\n\n{}",
            inputs.file_summary
        ),
        AnswerLanguage::English => format!(
            "You are a document-grounded AI assistant. Answer strictly in English. \
             Preserve technical terms verbatim if they appear in another language \
             in the source documents. Ground your answers only in the provided \
             context and conversation history; when the context is insufficient, \
             say you are not sure instead of fabricating an answer.\n\n{}",
            inputs.file_summary
        ),
    };

    let user = match inputs.answer_language {
        AnswerLanguage::Korean => format!(
            "질문: {}\n\n참고 문서:\n{}",
            inputs.question, inputs.context
        ),
        AnswerLanguage::English => format!(
            "Question: {}\n\nContext:\n{}",
            inputs.question, inputs.context
        ),
    };

    AssembledPrompt {
        system,
        history: inputs.history.to_vec(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    fn embedded(source: &str, text: &str) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: Chunk {
                id: "id".to_string(),
                source_file: source.to_string(),
                text: text.to_string(),
            },
            vector: Vec::new(),
        }
    }

    #[test]
    fn test_context_preserves_order_and_attribution() {
        let a = embedded("a.pdf", "first passage");
        let b = embedded("b.pdf", "second passage");
        let context = format_context(&[&a, &b]);

        assert_eq!(
            context,
            "[source: a.pdf]\nfirst passage\n\n[source: b.pdf]\nsecond passage"
        );
    }

    #[test]
    fn test_context_empty() {
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn test_file_summary() {
        let files = vec!["a.pdf".to_string(), "b.docx".to_string()];
        assert_eq!(summarize_files(&files), "2 document(s) loaded: a.pdf, b.docx");
    }

    #[test]
    fn test_korean_prompt_carries_directives_and_summary() {
        let prompt = build_prompt(&PromptInputs {
            question: "요약해 주세요",
            context: "[source: a.pdf]\n본문",
            history: &[],
            file_summary: "1 document(s) loaded: a.pdf",
            answer_language: AnswerLanguage::Korean,
        });

        assert!(prompt.system.contains("한국어로만"));
        assert!(prompt.system.contains("1 document(s) loaded: a.pdf"));
        assert!(prompt.user.starts_with("질문: 요약해 주세요"));
        assert!(prompt.user.contains("[source: a.pdf]\n본문"));
    }

    #[test]
    fn test_english_prompt_carries_directives_and_summary() {
        let prompt = build_prompt(&PromptInputs {
            question: "Summarize the document",
            context: "[source: a.pdf]\nbody",
            history: &[],
            file_summary: "1 document(s) loaded: a.pdf",
            answer_language: AnswerLanguage::English,
        });

        assert!(prompt.system.contains("strictly in English"));
        assert!(prompt.system.contains("1 document(s) loaded: a.pdf"));
        assert!(prompt.user.starts_with("Question: Summarize the document"));
    }

    #[test]
    fn test_history_preserved_in_order() {
        let history = vec![Turn::user("Q1"), Turn::assistant("A1"), Turn::user("Q2")];
        let prompt = build_prompt(&PromptInputs {
            question: "next",
            context: "",
            history: &history,
            file_summary: "1 document(s) loaded: a.pdf",
            answer_language: AnswerLanguage::English,
        });

        assert_eq!(prompt.history, history);
    }
}
