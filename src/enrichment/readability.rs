//! Readability metrics for simplified text
//!
//! Heuristic counts only: sentences are terminal punctuation marks, syllables
//! are vowel groups with a silent trailing `e`.

use serde::{Deserialize, Serialize};
use std::fmt;

const GRADE_2_MAX_WORDS: f32 = 8.0;
const GRADE_2_MAX_SYLLABLES: f32 = 1.2;

/// Estimated reading band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeBand {
    Grade1To2,
    Grade3To4,
    Grade5To6,
    Grade7Plus,
}

impl GradeBand {
    pub fn estimate(avg_words_per_sentence: f32, avg_syllables_per_word: f32) -> Self {
        if avg_words_per_sentence <= GRADE_2_MAX_WORDS
            && avg_syllables_per_word <= GRADE_2_MAX_SYLLABLES
        {
            GradeBand::Grade1To2
        } else if avg_words_per_sentence <= 10.0 && avg_syllables_per_word <= 1.4 {
            GradeBand::Grade3To4
        } else if avg_words_per_sentence <= 15.0 {
            GradeBand::Grade5To6
        } else {
            GradeBand::Grade7Plus
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GradeBand::Grade1To2 => "Grade 1-2",
            GradeBand::Grade3To4 => "Grade 3-4",
            GradeBand::Grade5To6 => "Grade 5-6",
            GradeBand::Grade7Plus => "Grade 7+",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityMetrics {
    pub total_words: usize,
    pub total_sentences: usize,
    /// Rounded to one decimal
    pub avg_words_per_sentence: f32,
    /// Rounded to one decimal
    pub avg_syllables_per_word: f32,
    pub estimated_grade: GradeBand,
    pub meets_grade_2_criteria: bool,
}

impl ReadabilityMetrics {
    pub fn measure(text: &str) -> Self {
        let sentences = text
            .chars()
            .filter(|c| matches!(c, '.' | '!' | '?'))
            .count()
            .max(1);

        let words: Vec<&str> = text.split_whitespace().collect();
        let syllables: usize = words.iter().map(|w| count_syllables(w)).sum();

        let avg_words = words.len() as f32 / sentences as f32;
        let avg_syllables = if words.is_empty() {
            0.0
        } else {
            syllables as f32 / words.len() as f32
        };

        Self {
            total_words: words.len(),
            total_sentences: sentences,
            avg_words_per_sentence: round1(avg_words),
            avg_syllables_per_word: round1(avg_syllables),
            estimated_grade: GradeBand::estimate(avg_words, avg_syllables),
            meets_grade_2_criteria: avg_words <= GRADE_2_MAX_WORDS
                && avg_syllables <= GRADE_2_MAX_SYLLABLES,
        }
    }
}

/// Vowel-group syllable count; tokens with no letters count zero
pub fn count_syllables(token: &str) -> usize {
    let word: String = token
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();

    if word.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut prev_vowel = false;
    for c in word.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }

    if word.ends_with('e') && count > 1 {
        count -= 1;
    }

    count.max(1)
}

fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}
