use crate::corpus::{CorpusStats, DocStore};
use crate::expand::{expand_query, SynonymTable};
use crate::filter::{filter_all, filter_any};
use crate::index::SearchIndexes;
use crate::rank::{default_field_weights, rank_documents, Bm25Params, FieldWeights, RankWeights};
use crate::tokenizer::{tokenize, Stopwords};
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of the description excerpt shown in a hit, in characters.
pub const EXCERPT_CHARS: usize = 200;

const UNKNOWN_TITLE: &str = "Unknown Title";
const NO_DESCRIPTION: &str = "No description available";

/// Candidate-selection policy: union over query terms, or intersection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Any,
    All,
}

impl FromStr for FilterMode {
    type Err = anyhow::Error;

    /// Unknown modes are rejected here, at the orchestrator boundary; the
    /// two policies are never mixed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(FilterMode::Any),
            "all" => Ok(FilterMode::All),
            other => bail!("unknown filter mode {other:?} (expected \"any\" or \"all\")"),
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Any => f.write_str("any"),
            FilterMode::All => f.write_str("all"),
        }
    }
}

/// Static configuration for one search session.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub stopwords: Stopwords,
    pub synonyms: SynonymTable,
    pub field_weights: FieldWeights,
    pub bm25: Bm25Params,
    pub rank_weights: RankWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            stopwords: Stopwords::english(),
            synonyms: SynonymTable::new(),
            field_weights: default_field_weights(),
            bm25: Bm25Params::default(),
            rank_weights: RankWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub description: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub total_documents: usize,
    pub filtered_documents: usize,
    pub results: Vec<SearchHit>,
}

/// Read-only query engine over fully built indexes. Queries are one
/// synchronous pipeline with no shared mutable state, so a `Searcher` can be
/// shared freely across threads.
#[derive(Debug, Clone, Default)]
pub struct Searcher {
    pub indexes: SearchIndexes,
    pub doc_store: DocStore,
    pub stats: CorpusStats,
    pub config: SearchConfig,
}

impl Searcher {
    pub fn new(
        indexes: SearchIndexes,
        doc_store: DocStore,
        stats: CorpusStats,
        config: SearchConfig,
    ) -> Self {
        Self {
            indexes,
            doc_store,
            stats,
            config,
        }
    }

    /// Answer one query: tokenize, expand with synonyms, filter under the
    /// requested policy, rank, and format. An empty filtered set is a valid
    /// zero-match result, not an error.
    pub fn search(&self, query: &str, mode: FilterMode) -> SearchResults {
        let tokens = tokenize(query, &self.config.stopwords);
        let expanded = expand_query(&tokens, &self.config.synonyms);

        let filtered = match mode {
            FilterMode::Any => filter_any(&expanded, &self.indexes),
            FilterMode::All => filter_all(&expanded, &self.indexes, &self.config.stopwords),
        };

        let ranked = rank_documents(
            &filtered,
            &expanded,
            &self.indexes,
            &self.doc_store,
            &self.stats,
            &self.config.field_weights,
            self.config.bm25,
            &self.config.rank_weights,
            &self.config.stopwords,
        );

        tracing::debug!(
            query,
            %mode,
            terms = expanded.len(),
            filtered = filtered.len(),
            "query answered"
        );

        let results = ranked
            .into_iter()
            .map(|(doc_id, score)| {
                let record = self.doc_store.get(&doc_id);
                let title = record
                    .map(|r| r.title.as_str())
                    .filter(|t| !t.is_empty())
                    .unwrap_or(UNKNOWN_TITLE)
                    .to_string();
                let description = record
                    .map(|r| r.description.as_str())
                    .filter(|d| !d.is_empty())
                    .map_or_else(|| NO_DESCRIPTION.to_string(), excerpt);
                SearchHit {
                    url: doc_id,
                    title,
                    description,
                    score: round2(score),
                }
            })
            .collect();

        SearchResults {
            total_documents: self.stats.total_documents,
            filtered_documents: filtered.len(),
            results,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// First `EXCERPT_CHARS` characters of the description, with an ellipsis
/// when truncated.
fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(EXCERPT_CHARS).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_mode_parses_known_values_only() {
        assert_eq!("any".parse::<FilterMode>().unwrap(), FilterMode::Any);
        assert_eq!("all".parse::<FilterMode>().unwrap(), FilterMode::All);
        assert!("fuzzy".parse::<FilterMode>().is_err());
    }

    #[test]
    fn rounds_scores_to_two_decimals() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(3.0), 3.0);
    }
}
