//! Wikipedia article abstracts read from an `enwiki-*-abstract.xml` dump

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use search_bench_core::{Document, DocumentGenerator, GeneratorError};
use serde::{Deserialize, Serialize};

/// A link listed under an abstract
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubLink {
    /// Anchor text
    pub text: String,
    /// Target URL
    pub url: String,
}

/// One `<doc>` of the abstract dump
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikipediaArticleAbstract {
    /// Sequential identifier, starting at 1
    pub id: u64,
    /// Page title, as written in the dump
    pub title: String,
    /// Page URL
    pub url: String,
    /// Abstract text
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Section links
    pub links: Vec<SubLink>,
}

impl Document for WikipediaArticleAbstract {
    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Url,
    Abstract,
    Anchor,
    Link,
}

/// Streams documents out of an abstract dump
///
/// The dump is re-read from the start on every `generate` call; ids keep
/// increasing across calls.
#[derive(Debug)]
pub struct WikipediaAbstractGenerator {
    path: PathBuf,
    next_id: u64,
}

impl WikipediaAbstractGenerator {
    /// Create a generator for the dump at `path`
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidConfig`] if `path` is not a file.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, GeneratorError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(GeneratorError::InvalidConfig(format!(
                "wikipedia abstract dump not found: {}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            next_id: 1,
        })
    }

    /// Path of the dump
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentGenerator<WikipediaArticleAbstract> for WikipediaAbstractGenerator {
    fn name(&self) -> &str {
        "wikipedia-article-abstract"
    }

    fn generate(
        &mut self,
        count: Option<usize>,
    ) -> Result<Vec<WikipediaArticleAbstract>, GeneratorError> {
        tracing::info!(path = %self.path.display(), limit = ?count, "Reading wikipedia abstracts");
        let file = File::open(&self.path)?;
        let docs = read_abstracts(BufReader::new(file), count, self.next_id)?;
        self.next_id += docs.len() as u64;
        Ok(docs)
    }
}

/// Parse `<doc>` elements from `input`, numbering them from `first_id`
///
/// Stops after `limit` documents when given.
pub fn read_abstracts<R: BufRead>(
    input: R,
    limit: Option<usize>,
    first_id: u64,
) -> Result<Vec<WikipediaArticleAbstract>, GeneratorError> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut docs = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<WikipediaArticleAbstract> = None;
    let mut sublink: Option<SubLink> = None;
    let mut field: Option<Field> = None;

    if limit == Some(0) {
        return Ok(docs);
    }

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            GeneratorError::Parse(format!("{} at byte {}", e, reader.buffer_position()))
        })?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"doc" => {
                    current = Some(WikipediaArticleAbstract {
                        id: first_id + docs.len() as u64,
                        ..Default::default()
                    })
                }
                b"title" => field = Some(Field::Title),
                b"url" => field = Some(Field::Url),
                b"abstract" => field = Some(Field::Abstract),
                b"sublink" => sublink = Some(SubLink::default()),
                b"anchor" => field = Some(Field::Anchor),
                b"link" => field = Some(Field::Link),
                _ => {}
            },
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| GeneratorError::Parse(err.to_string()))?;
                append(&mut current, &mut sublink, field, &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                append(&mut current, &mut sublink, field, &text);
            }
            Event::End(e) => match e.name().as_ref() {
                b"doc" => {
                    if let Some(doc) = current.take() {
                        docs.push(doc);
                        if limit.is_some_and(|n| docs.len() >= n) {
                            break;
                        }
                    }
                }
                b"sublink" => {
                    if let (Some(link), Some(doc)) = (sublink.take(), current.as_mut()) {
                        doc.links.push(link);
                    }
                }
                _ => field = None,
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    tracing::debug!(documents = docs.len(), "Parsed wikipedia abstracts");
    Ok(docs)
}

fn append(
    current: &mut Option<WikipediaArticleAbstract>,
    sublink: &mut Option<SubLink>,
    field: Option<Field>,
    text: &str,
) {
    let (Some(doc), Some(field)) = (current.as_mut(), field) else {
        return;
    };

    let target = match field {
        Field::Title => &mut doc.title,
        Field::Url => &mut doc.url,
        Field::Abstract => &mut doc.abstract_text,
        Field::Anchor => match sublink.as_mut() {
            Some(link) => &mut link.text,
            None => return,
        },
        Field::Link => match sublink.as_mut() {
            Some(link) => &mut link.url,
            None => return,
        },
    };
    target.push_str(text);
}
