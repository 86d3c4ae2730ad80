//! Document generators for search-bench
//!
//! This crate provides implementations of the `DocumentGenerator` trait for:
//!
//! - Synthetic lorem-ipsum articles
//! - Wikipedia article abstracts read from an XML dump

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod article;
pub mod wikipedia;

pub use article::{Article, ArticleGenerator, DEFAULT_ARTICLE_COUNT};
pub use wikipedia::{read_abstracts, SubLink, WikipediaAbstractGenerator, WikipediaArticleAbstract};
