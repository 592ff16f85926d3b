//! Social story producer
//!
//! Stories follow Carol Gray's framework: descriptive, perspective, directive
//! and affirmative sentences in a positive tone.

use async_trait::async_trait;
use std::sync::Arc;

use crate::enrichment::adapter::EnrichmentProducer;
use crate::enrichment::types::{Personalization, TaskInput, TaskName, TaskPayload};
use crate::errors::{BridgeError, Result};
use crate::providers::{CompletionOptions, TextGenerator};

const SYSTEM_PROMPT: &str = "You are an expert in creating social stories for autistic children following Carol Gray's framework. Write clear, positive, helpful stories.";

const GUIDELINES: &str = r#"SOCIAL STORY FRAMEWORK (Carol Gray):
1. Descriptive sentences: What happens, where, when, who
2. Perspective sentences: How others feel or think
3. Directive sentences: What the child should do
4. Affirmative sentences: Reassurance and positive outcomes

RULES:
- Use first person ("I") or third person for the child
- Present or future tense
- Positive, reassuring tone
- 5-10 sentences total
- Clear, simple language
- Include what to expect and how to respond"#;

pub struct StoryGenerator {
    generator: Arc<dyn TextGenerator>,
}

/// Title and body split out of a model reply
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStory {
    pub title: String,
    pub story: String,
}

impl StoryGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn prompt(situation: &str, personalization: &Personalization) -> String {
        let level = personalization.reading_level;
        format!(
            "Create a social story about: {situation}\n\n\
             Child's name: {name}\n\
             Reading level: {level}\n\n\
             {GUIDELINES}\n\n\
             Language: {guide}\n\n\
             Write a complete social story with:\n\
             1. A clear title\n\
             2. 5-10 sentences following the framework above\n\
             3. Positive, reassuring tone\n\
             4. Practical guidance\n\n\
             Format:\n\
             Title: [Clear, simple title]\n\n\
             [The story - 5-10 sentences]\n\n\
             Respond with ONLY the title and story, no preamble.",
            name = personalization.child_name(),
            guide = level.language_guide(),
        )
    }
}

/// Split a reply into title and story lines
///
/// The first `Title:` line supplies the title; other lines starting with
/// "Title" are dropped. Falls back to "About <Situation>" when none is given.
pub fn parse_story(reply: &str, situation: &str) -> ParsedStory {
    let mut title = String::new();
    let mut body = Vec::new();

    for line in reply.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Title:") {
            if title.is_empty() {
                title = rest.trim().to_string();
            }
        } else if !line.is_empty() && !line.starts_with("Title") {
            body.push(line);
        }
    }

    if title.is_empty() {
        title = format!("About {}", title_case(situation));
    }

    ParsedStory {
        title,
        story: body.join("\n"),
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[async_trait]
impl EnrichmentProducer for StoryGenerator {
    fn task(&self) -> TaskName {
        TaskName::Story
    }

    async fn produce(&self, input: &TaskInput) -> Result<TaskPayload> {
        let (situation, personalization) = match input {
            TaskInput::Situation {
                situation,
                personalization,
            } => (situation, personalization),
            other => {
                return Err(BridgeError::ProducerError(format!(
                    "story expects a situation, got {:?}",
                    other
                )))
            }
        };

        let options = CompletionOptions {
            system: Some(SYSTEM_PROMPT.to_string()),
            temperature: Some(0.7),
            max_tokens: Some(512),
        };

        let reply = self
            .generator
            .complete(&Self::prompt(situation, personalization), &options)
            .await?;

        let parsed = parse_story(&reply, situation);
        if parsed.story.is_empty() {
            return Err(BridgeError::ProducerError("Story came back empty".to_string()));
        }

        Ok(TaskPayload::Story {
            title: parsed.title,
            story: parsed.story,
            situation: situation.clone(),
            child_name: personalization.child_name().to_string(),
            reading_level: personalization.reading_level,
            full_text: reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::types::ReadingLevel;

    struct Fixed(&'static str);

    #[async_trait]
    impl TextGenerator for Fixed {
        async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> Result<String> {
            assert!(prompt.contains("Carol Gray"));
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_parse_with_title() {
        let parsed = parse_story(
            "Title: My Doctor Visit\n\nI go to the doctor.\n\nThe doctor is kind.",
            "going to the doctor",
        );
        assert_eq!(parsed.title, "My Doctor Visit");
        assert_eq!(parsed.story, "I go to the doctor.\nThe doctor is kind.");
    }

    #[test]
    fn test_parse_without_title_falls_back() {
        let parsed = parse_story("I hear a loud sound.\nI can cover my ears.", "dealing with loud noises");
        assert_eq!(parsed.title, "About Dealing With Loud Noises");
        assert_eq!(parsed.story.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_story_payload() {
        let producer = StoryGenerator::new(Arc::new(Fixed("Title: School Day\nI go to school.")));
        let input = TaskInput::Situation {
            situation: "going to school".to_string(),
            personalization: Personalization {
                child_name: Some("Sam".to_string()),
                reading_level: ReadingLevel::Grade3,
            },
        };

        match producer.produce(&input).await.unwrap() {
            TaskPayload::Story {
                title,
                story,
                child_name,
                reading_level,
                ..
            } => {
                assert_eq!(title, "School Day");
                assert_eq!(story, "I go to school.");
                assert_eq!(child_name, "Sam");
                assert_eq!(reading_level, ReadingLevel::Grade3);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_title_only_reply_is_error() {
        let producer = StoryGenerator::new(Arc::new(Fixed("Title: Nothing Here")));
        let input = TaskInput::Situation {
            situation: "learning new things".to_string(),
            personalization: Personalization::default(),
        };
        assert!(producer.produce(&input).await.is_err());
    }
}
