use crate::corpus::{CorpusStats, DocId, DocStore};
use crate::index::SearchIndexes;
use crate::tokenizer::{tokenize, Stopwords};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// BM25 free parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

/// Weights combining the BM25 total with the linear heuristic. These are
/// hand-picked tunables, not learned values; they live here as named fields
/// so callers can override them instead of digging constants out of the
/// scoring loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankWeights {
    /// Multiplier on the weighted BM25 total.
    pub bm25: f64,
    /// Per query term present in the title.
    pub title_hit: f64,
    /// Per query term present in the description.
    pub description_hit: f64,
    /// Per query term present in the origin feature.
    pub origin_hit: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            bm25: 1.5,
            title_hit: 2.0,
            description_hit: 1.0,
            origin_hit: 3.0,
        }
    }
}

/// Per-field multiplier on the BM25 contribution. Fields with weight <= 0
/// are skipped entirely.
pub type FieldWeights = BTreeMap<String, f64>;

pub fn default_field_weights() -> FieldWeights {
    FieldWeights::from([
        ("title".to_string(), 3.0),
        ("description".to_string(), 1.0),
        ("brand".to_string(), 2.0),
        ("origin".to_string(), 2.0),
    ])
}

/// Multi-field BM25 for one candidate document. For each weighted field:
/// doclen is the tokenized raw-text length (min 1), avgdl comes from corpus
/// statistics, df/tf come from that field's index (positional tf = position
/// count, presence tf = 0/1), and
/// `idf = ln((N - df + 0.5)/(df + 0.5) + 1)`.
#[allow(clippy::too_many_arguments)]
pub fn compute_bm25(
    doc_id: &str,
    terms: &BTreeSet<String>,
    indexes: &SearchIndexes,
    doc_store: &DocStore,
    stats: &CorpusStats,
    field_weights: &FieldWeights,
    params: Bm25Params,
    stopwords: &Stopwords,
) -> f64 {
    let total_docs = stats.total_documents.max(1) as f64;
    let mut score = 0.0;

    for (field, &weight) in field_weights {
        if weight <= 0.0 {
            continue;
        }
        let Some(field_index) = indexes.field_index(field) else {
            continue;
        };

        let field_text = doc_store.field_text(doc_id, field).unwrap_or("");
        let doc_len = tokenize(field_text, stopwords).len().max(1) as f64;
        let avgdl = stats.avgdl(field);

        for term in terms {
            let df = field_index.df(term);
            if df == 0 {
                continue;
            }
            let tf = field_index.tf(term, doc_id);
            let idf = ((total_docs - df as f64 + 0.5) / (df as f64 + 0.5) + 1.0).ln();
            let denominator = tf + params.k1 * (1.0 - params.b + params.b * doc_len / avgdl);
            if denominator == 0.0 {
                continue;
            }
            score += weight * idf * (tf * (params.k1 + 1.0)) / denominator;
        }
    }
    score
}

/// Cheap secondary signal: weighted counts of query terms present in title,
/// description and origin, plus the document's average review rating
/// (0 when unreviewed).
pub fn compute_linear_score(
    doc_id: &str,
    terms: &BTreeSet<String>,
    indexes: &SearchIndexes,
    weights: &RankWeights,
) -> f64 {
    let title_hits = terms
        .iter()
        .filter(|term| indexes.title.contains(term, doc_id))
        .count() as f64;
    let description_hits = terms
        .iter()
        .filter(|term| indexes.description.contains(term, doc_id))
        .count() as f64;
    let origin_hits = indexes
        .features
        .get("origin")
        .map_or(0.0, |origin_index| {
            terms
                .iter()
                .filter(|term| origin_index.contains(term, doc_id))
                .count() as f64
        });

    weights.title_hit * title_hits
        + weights.description_hit * description_hits
        + indexes.reviews.average_score(doc_id)
        + weights.origin_hit * origin_hits
}

/// Score every filtered candidate and sort descending. Candidates are
/// ordered by doc ID before the stable sort, so equal scores keep a
/// deterministic relative order.
#[allow(clippy::too_many_arguments)]
pub fn rank_documents(
    filtered: &HashMap<DocId, u32>,
    terms: &BTreeSet<String>,
    indexes: &SearchIndexes,
    doc_store: &DocStore,
    stats: &CorpusStats,
    field_weights: &FieldWeights,
    params: Bm25Params,
    rank_weights: &RankWeights,
    stopwords: &Stopwords,
) -> Vec<(DocId, f64)> {
    let mut candidates: Vec<&DocId> = filtered.keys().collect();
    candidates.sort();

    let mut scored: Vec<(DocId, f64)> = candidates
        .into_iter()
        .map(|doc_id| {
            let bm25 = compute_bm25(
                doc_id,
                terms,
                indexes,
                doc_store,
                stats,
                field_weights,
                params,
                stopwords,
            );
            let linear = compute_linear_score(doc_id, terms, indexes, rank_weights);
            (doc_id.clone(), rank_weights.bm25 * bm25 + linear)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
}
