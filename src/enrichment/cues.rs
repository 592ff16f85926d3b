// Keyword cues that turn a question into producer inputs.
// First match wins; matching is case-insensitive substring search.

const DEFAULT_SITUATION: &str = "learning new things";

const IMAGE_PROMPTS: &[(&[&str], &str)] = &[
    (&["sensory"], "child with autism using sensory toys, educational setting"),
    (&["communication", "talk"], "child using communication cards, friendly setting"),
    (&["diagnosis", "doctor"], "doctor meeting with child and parent, medical office"),
    (&["school", "classroom"], "child in inclusive classroom, learning environment"),
];

const DEFAULT_IMAGE_PROMPT: &str = "diverse children with autism in educational setting";

/// Social situation a story should cover
pub fn situation_for(question: &str) -> String {
    let lower = question.to_lowercase();

    let situation = if lower.contains("doctor") {
        "going to the doctor"
    } else if lower.contains("school") {
        "going to school"
    } else if lower.contains("new") && lower.contains("people") {
        "meeting new people"
    } else if lower.contains("loud") || lower.contains("noise") {
        "dealing with loud noises"
    } else {
        DEFAULT_SITUATION
    };

    situation.to_string()
}

/// Scene description for the illustrator
pub fn image_prompt_for(question: &str) -> String {
    let lower = question.to_lowercase();

    IMAGE_PROMPTS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, prompt)| *prompt)
        .unwrap_or(DEFAULT_IMAGE_PROMPT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_situations() {
        assert_eq!(situation_for("Visiting the DOCTOR tomorrow"), "going to the doctor");
        assert_eq!(situation_for("first day of school"), "going to school");
        assert_eq!(situation_for("Meeting new people at a party"), "meeting new people");
        assert_eq!(situation_for("Why is noise hard?"), "dealing with loud noises");
        assert_eq!(situation_for("What causes early regression?"), "learning new things");
    }

    #[test]
    fn test_situation_precedence() {
        // school outranks the people cue, the people cue outranks noise
        assert_eq!(situation_for("new people at school"), "going to school");
        assert_eq!(situation_for("loud new people"), "meeting new people");
    }

    #[test]
    fn test_image_prompts() {
        assert_eq!(
            image_prompt_for("sensory processing"),
            "child with autism using sensory toys, educational setting"
        );
        assert_eq!(
            image_prompt_for("How do I talk to my son?"),
            "child using communication cards, friendly setting"
        );
        assert_eq!(
            image_prompt_for("getting a diagnosis"),
            "doctor meeting with child and parent, medical office"
        );
        assert_eq!(
            image_prompt_for("classroom support"),
            "child in inclusive classroom, learning environment"
        );
        assert_eq!(image_prompt_for("asdkj##"), DEFAULT_IMAGE_PROMPT);
    }
}
