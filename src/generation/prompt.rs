//! Grounded prompt construction
//!
//! The prompt carries the retrieved chunks as numbered context blocks and
//! instructs the model to answer only from them, admitting insufficiency
//! instead of improvising.

use crate::types::RetrievedChunk;

/// Builds generation prompts from retrieved context
pub struct PromptBuilder;

impl PromptBuilder {
    /// Assemble the full prompt for a question and its retrieved context
    ///
    /// Chunks appear in retrieval order, numbered from 1, each labeled
    /// with its source document so the model can attribute statements.
    pub fn build(question: &str, context: &[RetrievedChunk]) -> String {
        let mut prompt = String::with_capacity(1024);
        prompt.push_str(
            "You are a document assistant. Answer the question using only the \
             context excerpts below.\n\
             Rules:\n\
             - Base every statement on the provided excerpts.\n\
             - If the excerpts do not contain enough information, say so \
             plainly instead of guessing.\n\
             - Do not use outside knowledge.\n\n",
        );

        prompt.push_str("Context:\n");
        for (i, hit) in context.iter().enumerate() {
            prompt.push_str(&format!(
                "[{}] (from {})\n{}\n\n",
                i + 1,
                hit.chunk.source.filename,
                hit.chunk.content.trim()
            ));
        }

        prompt.push_str(&format!("Question: {}\n\nAnswer:", question.trim()));
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Chunk, ChunkSource};
    use uuid::Uuid;

    fn hit(filename: &str, content: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk: Chunk::new(
                Uuid::new_v4(),
                0,
                content.to_string(),
                ChunkSource::text(filename.to_string()),
            ),
            similarity: 0.9,
        }
    }

    #[test]
    fn context_blocks_are_numbered_and_attributed() {
        let prompt = PromptBuilder::build(
            "What is the capital?",
            &[
                hit("geo.txt", "Paris is the capital of France."),
                hit("extra.txt", "Berlin is the capital of Germany."),
            ],
        );

        assert!(prompt.contains("[1] (from geo.txt)"));
        assert!(prompt.contains("Paris is the capital of France."));
        assert!(prompt.contains("[2] (from extra.txt)"));
        let p1 = prompt.find("[1]").unwrap();
        let p2 = prompt.find("[2]").unwrap();
        assert!(p1 < p2);
    }

    #[test]
    fn question_comes_after_context() {
        let prompt = PromptBuilder::build("Why?", &[hit("a.txt", "Because.")]);
        let context_pos = prompt.find("Context:").unwrap();
        let question_pos = prompt.find("Question: Why?").unwrap();
        assert!(context_pos < question_pos);
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn grounding_rules_are_present() {
        let prompt = PromptBuilder::build("Q", &[]);
        assert!(prompt.contains("only the"));
        assert!(prompt.contains("instead of guessing"));
    }
}
