//! Synthetic article corpus

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use search_bench_core::{Document, DocumentGenerator, GeneratorError};
use serde::{Deserialize, Serialize};

/// Articles generated when no count is requested
pub const DEFAULT_ARTICLE_COUNT: usize = 100_000;

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in", "reprehenderit",
    "voluptate", "velit", "esse", "cillum", "fugiat", "nulla", "pariatur", "excepteur", "sint",
    "occaecat", "cupidatat", "non", "proident", "sunt", "culpa", "qui", "officia", "deserunt",
    "mollit", "anim", "id", "est", "laborum", "music", "popular",
];

/// A synthetic blog-style article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Sequential identifier, starting at 1
    pub id: u64,
    /// One sentence
    pub title: String,
    /// Three to eight paragraphs separated by newlines
    pub body: String,
    /// Creation time, unix seconds
    pub created_at: u64,
}

impl Document for Article {
    fn id(&self) -> u64 {
        self.id
    }
}

/// Generates lorem-ipsum articles
///
/// Ids keep increasing across `generate` calls on the same generator.
pub struct ArticleGenerator {
    rng: StdRng,
    next_id: u64,
    default_count: usize,
}

impl ArticleGenerator {
    /// Create a generator seeded from system entropy
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a reproducible generator
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            next_id: 1,
            default_count: DEFAULT_ARTICLE_COUNT,
        }
    }

    /// Set the count used when `generate` gets `None`
    pub fn with_default_count(mut self, count: usize) -> Self {
        self.default_count = count;
        self
    }

    fn sentence(&mut self) -> String {
        let len = self.rng.gen_range(4..=10);
        let words: Vec<&str> = (0..len)
            .filter_map(|_| WORDS.choose(&mut self.rng).copied())
            .collect();

        let mut sentence = words.join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }

    fn paragraph(&mut self) -> String {
        let len = self.rng.gen_range(3..=6);
        (0..len)
            .map(|_| self.sentence())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn article(&mut self, created_at: u64) -> Article {
        let id = self.next_id;
        self.next_id += 1;

        let paragraphs = self.rng.gen_range(3..=8);
        let body = (0..paragraphs)
            .map(|_| self.paragraph())
            .collect::<Vec<_>>()
            .join("\n");

        Article {
            id,
            title: self.sentence(),
            body,
            created_at,
        }
    }
}

impl Default for ArticleGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentGenerator<Article> for ArticleGenerator {
    fn name(&self) -> &str {
        "articles"
    }

    fn generate(&mut self, count: Option<usize>) -> Result<Vec<Article>, GeneratorError> {
        let count = count.unwrap_or(self.default_count);
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        tracing::debug!(count, first_id = self.next_id, "Generating articles");
        Ok((0..count).map(|_| self.article(created_at)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_across_calls() {
        let mut generator = ArticleGenerator::with_seed(7);

        let first = generator.generate(Some(3)).unwrap();
        let second = generator.generate(Some(2)).unwrap();

        let ids: Vec<u64> = first.iter().chain(&second).map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_default_count() {
        let mut generator = ArticleGenerator::with_seed(1).with_default_count(25);
        assert_eq!(generator.generate(None).unwrap().len(), 25);
        assert_eq!(ArticleGenerator::with_seed(1).default_count, DEFAULT_ARTICLE_COUNT);
    }

    #[test]
    fn test_article_shape() {
        let mut generator = ArticleGenerator::with_seed(42);

        for article in generator.generate(Some(20)).unwrap() {
            assert!(article.title.ends_with('.'));
            assert!(article.title.chars().next().unwrap().is_ascii_uppercase());

            let paragraphs = article.body.split('\n').count();
            assert!((3..=8).contains(&paragraphs), "{} paragraphs", paragraphs);
            assert!(article.created_at > 0);
        }
    }

    #[test]
    fn test_same_seed_same_text() {
        let a = ArticleGenerator::with_seed(99).generate(Some(5)).unwrap();
        let b = ArticleGenerator::with_seed(99).generate(Some(5)).unwrap();

        let text = |docs: &[Article]| -> Vec<(String, String)> {
            docs.iter().map(|d| (d.title.clone(), d.body.clone())).collect()
        };
        assert_eq!(text(&a), text(&b));
    }

    #[test]
    fn test_article_json_fields() {
        let mut generator = ArticleGenerator::with_seed(3);
        let article = &generator.generate(Some(1)).unwrap()[0];
        let json = serde_json::to_value(article).unwrap();

        assert_eq!(json["id"], 1);
        assert!(json["title"].is_string());
        assert!(json["body"].is_string());
        assert!(json["created_at"].is_u64());
    }
}
