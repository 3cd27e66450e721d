// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads the training corpus from a UTF-8 text file.
//
// Format: one sample per line. Blank (or whitespace-only) lines
// are skipped. Each surviving line becomes an Utterance tagged
// "file:line" so diagnostics can point back at the corpus.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::domain::traits::UtteranceSource;
use crate::domain::utterance::Utterance;

/// Loads utterances from a single plain-text file.
/// Implements the UtteranceSource trait from Layer 3.
pub struct TextLoader {
    /// Path to the corpus file
    path: String,
}

impl TextLoader {
    /// Create a new TextLoader pointed at a corpus file
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl UtteranceSource for TextLoader {
    fn load_all(&self) -> Result<Vec<Utterance>> {
        let path = Path::new(&self.path);

        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read corpus file '{}'", self.path))?;

        tracing::info!("Loaded {} bytes from '{}'", text.len(), self.path);

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("corpus");

        let utterances: Vec<Utterance> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                Utterance::new(format!("{}:{}", file_name, i + 1), line.trim())
            })
            .collect();

        tracing::info!("{} samples after skipping blank lines", utterances.len());
        Ok(utterances)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_corpus(content: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{content}").unwrap();
        (dir, path.to_str().unwrap().to_string())
    }

    #[test]
    fn test_one_utterance_per_line() {
        let (_dir, path) = write_corpus("the cat sat\nthe dog ran\n");
        let loaded = TextLoader::new(&path).load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].text, "the cat sat");
        assert_eq!(loaded[1].text, "the dog ran");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let (_dir, path) = write_corpus("first\n\n   \nsecond\n");
        let loaded = TextLoader::new(&path).load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        // Source tags keep the original line numbers
        assert!(loaded[1].source.ends_with(":4"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let loader = TextLoader::new("/nonexistent/corpus.txt");
        assert!(loader.load_all().is_err());
    }
}
