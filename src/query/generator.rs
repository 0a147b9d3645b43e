// file: src/query/generator.rs
// description: builds grounded prompts and produces answers via the LLM

use crate::error::Result;
use crate::llm::OllamaClient;
use crate::models::SearchHit;
use std::sync::Arc;
use tracing::debug;

/// Answer returned to the caller: the generated text plus the distinct
/// documents that contributed context, in rank order.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

const SYSTEM_PREAMBLE: &str = "You are a helpful assistant for a restaurant. \
Answer the question using only the provided context. Each context passage is \
tagged with its source document. If the context does not contain the answer, \
say so instead of guessing.";

const FALLBACK_ANSWER: &str =
    "I couldn't find any relevant information in the restaurant documents to answer your question.";

/// Generation half of the query path. Formats retrieved chunks into a
/// source-tagged prompt and hands it to the LLM.
pub struct AnswerGenerator {
    llm: Arc<OllamaClient>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<OllamaClient>) -> Self {
        Self { llm }
    }

    /// Answer `question` from the retrieved `hits`. With no hits the
    /// fallback answer is returned without calling the LLM at all.
    pub async fn answer(
        &self,
        question: &str,
        hits: &[SearchHit],
        customer_data: Option<&str>,
    ) -> Result<Answer> {
        if hits.is_empty() {
            debug!("No context retrieved, returning fallback answer");
            return Ok(Answer {
                text: FALLBACK_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let prompt = build_prompt(question, hits, customer_data);
        let text = self.llm.generate(&prompt).await?;

        Ok(Answer {
            text,
            sources: distinct_sources(hits),
        })
    }
}

fn build_prompt(question: &str, hits: &[SearchHit], customer_data: Option<&str>) -> String {
    let mut prompt = String::with_capacity(1024);
    prompt.push_str(SYSTEM_PREAMBLE);
    prompt.push_str("\n\nContext:\n");

    for hit in hits {
        prompt.push_str(&format!("[source: {}]\n{}\n\n", hit.document, hit.text));
    }

    if let Some(data) = customer_data {
        let data = data.trim();
        if !data.is_empty() {
            prompt.push_str("Customer Data:\n");
            prompt.push_str(data);
            prompt.push_str("\n\n");
        }
    }

    prompt.push_str(&format!("Question: {}\n\nAnswer:", question));
    prompt
}

/// Distinct source documents in first-appearance (rank) order.
fn distinct_sources(hits: &[SearchHit]) -> Vec<String> {
    let mut sources = Vec::new();
    for hit in hits {
        if !sources.contains(&hit.document) {
            sources.push(hit.document.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hit(document: &str, ordinal: u32, text: &str) -> SearchHit {
        SearchHit::new(document.to_string(), ordinal, text.to_string(), 0.9, Some(0.1))
    }

    #[test]
    fn test_prompt_tags_every_chunk_with_its_source() {
        let hits = vec![
            hit("menu.pdf", 0, "Tuesday special: mushroom risotto."),
            hit("allergens.txt", 2, "Risotto contains dairy."),
        ];

        let prompt = build_prompt("What is the Tuesday special?", &hits, None);

        assert!(prompt.contains("[source: menu.pdf]\nTuesday special: mushroom risotto."));
        assert!(prompt.contains("[source: allergens.txt]\nRisotto contains dairy."));
        assert!(prompt.contains("Question: What is the Tuesday special?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_prompt_includes_customer_data_when_present() {
        let hits = vec![hit("menu.pdf", 0, "We offer vegan options.")];

        let prompt = build_prompt("Any vegan dishes?", &hits, Some("Allergy: peanuts"));
        assert!(prompt.contains("Customer Data:\nAllergy: peanuts"));

        let prompt = build_prompt("Any vegan dishes?", &hits, Some("   "));
        assert!(!prompt.contains("Customer Data:"));

        let prompt = build_prompt("Any vegan dishes?", &hits, None);
        assert!(!prompt.contains("Customer Data:"));
    }

    #[test]
    fn test_sources_are_distinct_and_rank_ordered() {
        let hits = vec![
            hit("menu.pdf", 3, "a"),
            hit("hours.md", 0, "b"),
            hit("menu.pdf", 1, "c"),
        ];

        assert_eq!(
            distinct_sources(&hits),
            vec!["menu.pdf".to_string(), "hours.md".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_context_short_circuits_to_fallback() {
        // port 9 is discard; a real request here would fail, proving the
        // LLM is never called on the empty-context path
        let config = crate::config::LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            generate_model: "test".to_string(),
            embed_model: "test".to_string(),
            temperature: 0.0,
            request_timeout_secs: 1,
        };
        let llm = Arc::new(OllamaClient::new(&config).unwrap());
        let generator = AnswerGenerator::new(llm);

        let answer = generator.answer("anything?", &[], None).await.unwrap();
        assert_eq!(answer.text, FALLBACK_ANSWER);
        assert!(answer.sources.is_empty());
    }
}
