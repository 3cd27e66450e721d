// ============================================================
// Layer 4 — Word Tokenizer
// ============================================================
// Splits one utterance into word tokens before vocabulary
// construction.
//
// Rules, applied in order:
//   1. Lowercase the whole line.
//   2. Walk characters: alphanumeric runs (apostrophes allowed
//      inside a word, as in "don't") become word tokens; every
//      other non-whitespace character becomes its own token.
//   3. A token that is entirely digits and longer than one
//      character is split into individual digit tokens, so "42"
//      yields "4" "2". Digits are discrete vocabulary entries,
//      not learned numerals.

/// Tokenize a single line into word tokens.
pub fn tokenize(line: &str) -> Vec<String> {
    let lower = line.to_lowercase();

    let mut raw: Vec<String> = Vec::new();
    let mut word = String::new();

    for c in lower.chars() {
        if c.is_alphanumeric() || (c == '\'' && !word.is_empty()) {
            word.push(c);
        } else {
            if !word.is_empty() {
                raw.push(std::mem::take(&mut word));
            }
            // Punctuation becomes a standalone token; whitespace is a separator
            if !c.is_whitespace() {
                raw.push(c.to_string());
            }
        }
    }
    if !word.is_empty() {
        raw.push(word);
    }

    // Split multi-digit integers into their constituent digits
    let mut tokens = Vec::with_capacity(raw.len());
    for t in raw {
        if t.len() > 1 && t.chars().all(|c| c.is_ascii_digit()) {
            tokens.extend(t.chars().map(|c| c.to_string()));
        } else {
            tokens.push(t);
        }
    }
    tokens
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_words() {
        assert_eq!(tokenize("the cat sat"), vec!["the", "cat", "sat"]);
    }

    #[test]
    fn test_lowercases() {
        assert_eq!(tokenize("The CAT"), vec!["the", "cat"]);
    }

    #[test]
    fn test_punctuation_is_standalone() {
        assert_eq!(tokenize("hello, world!"), vec!["hello", ",", "world", "!"]);
    }

    #[test]
    fn test_multi_digit_integers_split() {
        assert_eq!(tokenize("count 42 sheep"), vec!["count", "4", "2", "sheep"]);
        // A single digit stays a single token
        assert_eq!(tokenize("take 7"), vec!["take", "7"]);
    }

    #[test]
    fn test_mixed_alnum_not_split() {
        // "b2b" is a word, not an integer, so it is kept whole
        assert_eq!(tokenize("b2b sales"), vec!["b2b", "sales"]);
    }

    #[test]
    fn test_apostrophe_inside_word() {
        assert_eq!(tokenize("don't stop"), vec!["don't", "stop"]);
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t ").is_empty());
    }
}
