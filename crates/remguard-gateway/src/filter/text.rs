use async_trait::async_trait;

use remguard_core::error::Result;

/// Text moderation service.
///
/// Returns the filtered form of `s`. Any difference from the input means
/// the text was flagged.
#[async_trait]
pub trait TextFilter: Send + Sync {
    async fn filter_text(&self, s: &str) -> Result<String>;
}

/// Masks configured words (ASCII case-insensitive) with `#`.
#[derive(Debug, Default)]
pub struct WordListFilter {
    words: Vec<String>,
}

impl WordListFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_ascii_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    fn mask(&self, s: &str) -> String {
        let lower = s.to_ascii_lowercase();
        let mut out = s.as_bytes().to_vec();
        for w in &self.words {
            let mut from = 0;
            while let Some(pos) = lower[from..].find(w.as_str()) {
                let start = from + pos;
                for b in &mut out[start..start + w.len()] {
                    *b = b'#';
                }
                from = start + w.len();
            }
        }
        // ASCII lowering keeps byte offsets, and words only match whole
        // UTF-8 sequences, so the masked bytes stay valid UTF-8.
        String::from_utf8(out).unwrap_or_else(|_| "#".repeat(s.len()))
    }
}

#[async_trait]
impl TextFilter for WordListFilter {
    async fn filter_text(&self, s: &str) -> Result<String> {
        Ok(self.mask(s))
    }
}
