//! Text normalization applied before lexical vectorization.

use super::stopwords;

/// Normalize a raw string.
///
/// Lowercases, replaces ASCII punctuation and digits with spaces, splits on
/// whitespace, drops NLTK English stopwords and rejoins with single spaces.
pub fn preprocess_text(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_punctuation() || c.is_ascii_digit() {
                ' '
            } else {
                c
            }
        })
        .collect();

    let stop = stopwords::nltk_english();
    cleaned
        .split_whitespace()
        .filter(|word| !stop.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_stopwords_and_lowercases() {
        assert_eq!(preprocess_text("The Quick Fox"), "quick fox");
    }

    #[test]
    fn test_strips_punctuation_and_digits() {
        assert_eq!(
            preprocess_text("GPT-4: a 175B-parameter (model)!"),
            "gpt b parameter model"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(preprocess_text(""), "");
        assert_eq!(preprocess_text("   \t\n"), "");
        assert_eq!(preprocess_text("the and of"), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "The Quick Fox",
            "Self-Supervised Learning of 3D point-clouds, revisited.",
            "  Ünïcode  Äpfel: über_alles  ",
            "don't stop-believing (2019)",
        ];
        for input in inputs {
            let once = preprocess_text(input);
            assert_eq!(preprocess_text(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_non_ascii_letters_survive() {
        assert_eq!(preprocess_text("Müller's café"), "müller café");
    }
}
