use crate::corpus::{CorpusStats, DocStore};
use crate::expand::SynonymTable;
use crate::index::{PositionalIndex, PresenceIndex, ReviewsIndex, SearchIndexes};
use crate::search::SearchResults;
use crate::tokenizer::Stopwords;
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, create_dir_all, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: usize,
    pub created_at: String,
    pub version: u32,
}

/// Well-known file layout of an index directory. Indexes are pure mapping
/// values persisted as whole JSON files; loading yields the same structure
/// building produced.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn term_index(&self, field: &str) -> PathBuf {
        self.root.join(format!("{field}_index.json"))
    }
    fn positional_index(&self, field: &str) -> PathBuf {
        self.root.join(format!("{field}_pos_index.json"))
    }
    fn features_dir(&self) -> PathBuf {
        self.root.join("features")
    }
    fn feature_index(&self, feature: &str) -> PathBuf {
        self.features_dir().join(format!("{feature}_index.json"))
    }
    fn reviews_index(&self) -> PathBuf {
        self.root.join("reviews_index.json")
    }
    fn doc_store(&self) -> PathBuf {
        self.root.join("doc_store.json")
    }
    fn corpus_stats(&self) -> PathBuf {
        self.root.join("corpus_stats.json")
    }
    fn meta(&self) -> PathBuf {
        self.root.join("meta.json")
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("refusing to overwrite {}", path.display());
    }
    if let Some(dir) = path.parent() {
        create_dir_all(dir)?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))
}

pub fn save_term_index(
    paths: &IndexPaths,
    field: &str,
    index: &PresenceIndex,
    overwrite: bool,
) -> Result<()> {
    save_json(&paths.term_index(field), index, overwrite)
}

pub fn load_term_index(paths: &IndexPaths, field: &str) -> Result<PresenceIndex> {
    load_json(&paths.term_index(field))
}

pub fn save_positional_index(
    paths: &IndexPaths,
    field: &str,
    index: &PositionalIndex,
    overwrite: bool,
) -> Result<()> {
    save_json(&paths.positional_index(field), index, overwrite)
}

pub fn load_positional_index(paths: &IndexPaths, field: &str) -> Result<PositionalIndex> {
    load_json(&paths.positional_index(field))
}

pub fn save_feature_index(
    paths: &IndexPaths,
    feature: &str,
    index: &PresenceIndex,
    overwrite: bool,
) -> Result<()> {
    save_json(&paths.feature_index(feature), index, overwrite)
}

pub fn load_feature_index(paths: &IndexPaths, feature: &str) -> Result<PresenceIndex> {
    load_json(&paths.feature_index(feature))
}

/// Names of all persisted feature indexes, from the features/ directory.
pub fn list_feature_indexes(paths: &IndexPaths) -> Result<Vec<String>> {
    let dir = paths.features_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if let Some(name) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix("_index.json"))
        {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

pub fn save_reviews_index(paths: &IndexPaths, index: &ReviewsIndex, overwrite: bool) -> Result<()> {
    save_json(&paths.reviews_index(), index, overwrite)
}

pub fn load_reviews_index(paths: &IndexPaths) -> Result<ReviewsIndex> {
    load_json(&paths.reviews_index())
}

pub fn save_doc_store(paths: &IndexPaths, store: &DocStore, overwrite: bool) -> Result<()> {
    save_json(&paths.doc_store(), store, overwrite)
}

pub fn load_doc_store(paths: &IndexPaths) -> Result<DocStore> {
    load_json(&paths.doc_store())
}

pub fn save_corpus_stats(paths: &IndexPaths, stats: &CorpusStats, overwrite: bool) -> Result<()> {
    save_json(&paths.corpus_stats(), stats, overwrite)
}

pub fn load_corpus_stats(paths: &IndexPaths) -> Result<CorpusStats> {
    load_json(&paths.corpus_stats())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    save_json(&paths.meta(), meta, true)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    load_json(&paths.meta())
}

/// Assemble everything the query pipeline reads from an index directory:
/// positional title/description indexes, every persisted feature index, and
/// the reviews index.
pub fn load_search_indexes(paths: &IndexPaths) -> Result<SearchIndexes> {
    let mut indexes = SearchIndexes {
        title: load_positional_index(paths, "title")?,
        description: load_positional_index(paths, "description")?,
        reviews: load_reviews_index(paths)?,
        features: BTreeMap::new(),
    };
    for feature in list_feature_indexes(paths)? {
        let index = load_feature_index(paths, &feature)?;
        indexes.features.insert(feature, index);
    }
    Ok(indexes)
}

/// One entry in the persisted query log.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub id: u64,
    pub query: String,
    pub results: SearchResults,
}

/// Append a query's results to the JSON query log, assigning the next
/// sequence number, and return the assigned id. A missing or unparsable log
/// restarts from an empty list rather than failing the query.
pub fn append_query_log(path: &Path, query: &str, results: &SearchResults) -> Result<u64> {
    let mut entries: Vec<QueryLogEntry> = match fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), %err, "query log unreadable, restarting it");
            Vec::new()
        }),
        Err(_) => Vec::new(),
    };

    let id = entries.len() as u64 + 1;
    entries.push(QueryLogEntry {
        id,
        query: query.to_string(),
        results: results.clone(),
    });
    save_json(path, &entries, true)?;
    Ok(id)
}

/// Stopword list: one word per line, blank lines ignored.
pub fn load_stopwords(path: &Path) -> Result<Stopwords> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(Stopwords::from_words(
        text.lines().map(str::trim).filter(|line| !line.is_empty()),
    ))
}

/// Flat synonym table: JSON object mapping a term to its equivalents.
pub fn load_synonyms(path: &Path) -> Result<SynonymTable> {
    load_json(path)
}
