//! Character-trigram embeddings.
//!
//! Deterministic, offline vectors: each content word contributes its hashed
//! trigrams (weighted by the square root of its frequency) and its own hash
//! (weighted by frequency). Words are lowercased and stripped of surrounding
//! punctuation, so "MCP?" and "mcp" embed identically.

use std::collections::HashMap;

use lectern_core::AppResult;

use crate::embeddings::provider::EmbeddingProvider;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "how", "does", "about",
];

#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Embed one text into a unit vector (zero vector for no content words).
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for (word, freq) in word_frequencies(text) {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let hash = window
                    .iter()
                    .fold(0u64, |acc, c| acc.wrapping_mul(37).wrapping_add(*c as u64));
                embedding[(hash as usize) % self.dimensions] += (freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            embedding[(word_hash as usize) % self.dimensions] += freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }
        embedding
    }
}

fn word_frequencies(text: &str) -> HashMap<String, u32> {
    let mut freq = HashMap::new();
    for raw in text.split_whitespace() {
        let word = raw
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if word.chars().count() < 3 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        *freq.entry(word).or_insert(0) += 1;
    }
    freq
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_embed_is_unit_length() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("Model Context Protocol servers").await.unwrap();
        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let provider = TrigramProvider::new(128);
        let texts = vec!["retrieval".to_string(), "generation".to_string()];
        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 2);
        assert_ne!(embeddings[0], embeddings[1]);
    }

    #[test]
    fn test_punctuation_and_case_ignored() {
        let provider = TrigramProvider::new(384);
        assert_eq!(provider.embed_text("What is MCP?"), provider.embed_text("mcp"));
    }

    #[test]
    fn test_stop_words_only_is_zero_vector() {
        let provider = TrigramProvider::new(64);
        assert!(provider.embed_text("what is the").iter().all(|&x| x == 0.0));
        assert!(provider.embed_text("").iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_related_text_scores_higher() {
        let provider = TrigramProvider::new(384);
        let query = provider.embed_text("tool calling protocol");
        let related = provider.embed_text("The protocol defines how tool calling works");
        let unrelated = provider.embed_text("Baking sourdough bread at home");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_utf8_safety() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed_text("Gamedex é um aplicativo 🎮 brasileiro");
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
