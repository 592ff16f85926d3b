//! Grade-2 simplification producer

use async_trait::async_trait;
use std::sync::Arc;

use crate::enrichment::adapter::EnrichmentProducer;
use crate::enrichment::readability::ReadabilityMetrics;
use crate::enrichment::types::{ReadingLevel, TaskInput, TaskName, TaskPayload};
use crate::errors::{BridgeError, Result};
use crate::providers::{CompletionOptions, TextGenerator};

const SYSTEM_PROMPT: &str =
    "You simplify text to Grade 2 level. Use tiny words. Make tiny sentences. Sound like a 7 year old.";

/// Rewrites retrieved context for a young reader
pub struct Simplifier {
    generator: Arc<dyn TextGenerator>,
}

impl Simplifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn prompt(text: &str) -> String {
        format!(
            r#"Rewrite this text for a 7-year-old child.

RULES (MUST FOLLOW):
1. Use ONLY 1-syllable words (like: kid, talk, play, run, see, help, good)
2. MAXIMUM 6 words per sentence
3. Start new sentence for each idea
4. Use simple grammar: subject + verb + object
5. No commas, just periods
6. Sound like a child talking

TEXT TO SIMPLIFY:
{}

EXAMPLES OF GOOD GRADE 2:
"Some kids are different."
"They talk their own way."
"This is called autism."
"They are good kids."

YOUR TURN - Write it simply (respond with ONLY the simple text):"#,
            text
        )
    }

    fn options() -> CompletionOptions {
        CompletionOptions {
            system: Some(SYSTEM_PROMPT.to_string()),
            temperature: Some(0.1),
            max_tokens: Some(300),
        }
    }
}

#[async_trait]
impl EnrichmentProducer for Simplifier {
    fn task(&self) -> TaskName {
        TaskName::Simplify
    }

    async fn produce(&self, input: &TaskInput) -> Result<TaskPayload> {
        let text = match input {
            TaskInput::Context { text } => text,
            other => {
                return Err(BridgeError::ProducerError(format!(
                    "simplify expects context input, got {:?}",
                    other
                )))
            }
        };

        if text.trim().is_empty() {
            return Err(BridgeError::ProducerError("Empty text provided".to_string()));
        }

        let simplified = self
            .generator
            .complete(&Self::prompt(text), &Self::options())
            .await?;

        if simplified.is_empty() {
            return Err(BridgeError::ProducerError(
                "Generator returned no text".to_string(),
            ));
        }

        tracing::debug!(chars = simplified.len(), "simplified context");

        Ok(TaskPayload::Simplified {
            metrics: ReadabilityMetrics::measure(&simplified),
            simplified_text: simplified,
            original_text: text.clone(),
            reading_level: ReadingLevel::Grade2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        reply: String,
        seen: Mutex<Vec<(String, CompletionOptions)>>,
    }

    impl Scripted {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((prompt.to_string(), options.clone()));
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_simplify_success() {
        let generator = Arc::new(Scripted::new("Some kids are not the same. They play."));
        let simplifier = Simplifier::new(generator.clone());

        let payload = simplifier
            .produce(&TaskInput::Context {
                text: "Regression is a loss of skills.".to_string(),
            })
            .await
            .unwrap();

        match payload {
            TaskPayload::Simplified {
                simplified_text,
                original_text,
                reading_level,
                metrics,
            } => {
                assert_eq!(simplified_text, "Some kids are not the same. They play.");
                assert_eq!(original_text, "Regression is a loss of skills.");
                assert_eq!(reading_level, ReadingLevel::Grade2);
                assert!(metrics.meets_grade_2_criteria);
            }
            other => panic!("unexpected payload {:?}", other),
        }

        let seen = generator.seen.lock().unwrap();
        assert!(seen[0].0.contains("Regression is a loss of skills."));
        assert_eq!(seen[0].1.max_tokens, Some(300));
    }

    #[tokio::test]
    async fn test_blank_context_fails_without_calling_model() {
        let generator = Arc::new(Scripted::new("ignored"));
        let simplifier = Simplifier::new(generator.clone());

        let result = simplifier
            .produce(&TaskInput::Context { text: "   ".to_string() })
            .await;

        assert!(matches!(result, Err(BridgeError::ProducerError(_))));
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_input_kind() {
        let simplifier = Simplifier::new(Arc::new(Scripted::new("x")));
        let result = simplifier
            .produce(&TaskInput::Prompt { prompt: "p".to_string() })
            .await;
        assert!(result.is_err());
    }
}
