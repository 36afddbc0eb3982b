use crate::corpus::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Inverted index recording only term presence: term -> set of doc IDs.
/// Used for the term index over title/description and for feature indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresenceIndex(pub BTreeMap<String, BTreeSet<DocId>>);

impl PresenceIndex {
    pub fn insert(&mut self, term: String, doc_id: DocId) {
        self.0.entry(term).or_default().insert(doc_id);
    }

    pub fn docs(&self, term: &str) -> Option<&BTreeSet<DocId>> {
        self.0.get(term)
    }

    /// Number of documents containing the term.
    pub fn df(&self, term: &str) -> usize {
        self.0.get(term).map_or(0, BTreeSet::len)
    }

    pub fn contains(&self, term: &str, doc_id: &str) -> bool {
        self.0.get(term).is_some_and(|docs| docs.contains(doc_id))
    }

    pub fn terms(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Inverted index additionally recording 0-based token positions per
/// document, in encounter order. Term frequency is the position count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionalIndex(pub BTreeMap<String, BTreeMap<DocId, Vec<u32>>>);

impl PositionalIndex {
    pub fn push(&mut self, term: String, doc_id: DocId, position: u32) {
        self.0
            .entry(term)
            .or_default()
            .entry(doc_id)
            .or_default()
            .push(position);
    }

    pub fn postings(&self, term: &str) -> Option<&BTreeMap<DocId, Vec<u32>>> {
        self.0.get(term)
    }

    pub fn df(&self, term: &str) -> usize {
        self.0.get(term).map_or(0, BTreeMap::len)
    }

    /// Term frequency: number of recorded positions for (term, doc).
    pub fn tf(&self, term: &str, doc_id: &str) -> u32 {
        self.0
            .get(term)
            .and_then(|docs| docs.get(doc_id))
            .map_or(0, |positions| positions.len() as u32)
    }

    pub fn contains(&self, term: &str, doc_id: &str) -> bool {
        self.tf(term, doc_id) > 0
    }

    pub fn terms(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Per-document reviews summary, derived once at build time.
/// `latest_score` is the rating of the last review in source order; the
/// corpus carries no timestamps, so this is list order, not recency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewsSummary {
    pub review_count: usize,
    pub average_score: f64,
    pub latest_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewsIndex(pub BTreeMap<DocId, ReviewsSummary>);

impl ReviewsIndex {
    pub fn insert(&mut self, doc_id: DocId, summary: ReviewsSummary) {
        self.0.insert(doc_id, summary);
    }

    pub fn summary(&self, doc_id: &str) -> Option<&ReviewsSummary> {
        self.0.get(doc_id)
    }

    /// Average rating for scoring; 0.0 for unreviewed documents.
    pub fn average_score(&self, doc_id: &str) -> f64 {
        self.0.get(doc_id).map_or(0.0, |s| s.average_score)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One field's index, tagged by kind. The shape is fixed at construction
/// time; readers never dispatch on the shape of loaded data.
#[derive(Debug, Clone, Copy)]
pub enum FieldIndex<'a> {
    Positional(&'a PositionalIndex),
    Presence(&'a PresenceIndex),
}

impl FieldIndex<'_> {
    pub fn df(&self, term: &str) -> usize {
        match self {
            FieldIndex::Positional(ix) => ix.df(term),
            FieldIndex::Presence(ix) => ix.df(term),
        }
    }

    /// Term frequency for (term, doc): position count for positional data,
    /// 0/1 for presence-only data.
    pub fn tf(&self, term: &str, doc_id: &str) -> f64 {
        match self {
            FieldIndex::Positional(ix) => f64::from(ix.tf(term, doc_id)),
            FieldIndex::Presence(ix) => {
                if ix.contains(term, doc_id) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    pub fn contains(&self, term: &str, doc_id: &str) -> bool {
        match self {
            FieldIndex::Positional(ix) => ix.contains(term, doc_id),
            FieldIndex::Presence(ix) => ix.contains(term, doc_id),
        }
    }

    pub fn doc_ids(&self, term: &str) -> Vec<&DocId> {
        match self {
            FieldIndex::Positional(ix) => ix
                .postings(term)
                .map(|docs| docs.keys().collect())
                .unwrap_or_default(),
            FieldIndex::Presence(ix) => ix
                .docs(term)
                .map(|docs| docs.iter().collect())
                .unwrap_or_default(),
        }
    }
}

/// Everything the query pipeline reads: positional indexes for the two text
/// fields, presence indexes per named feature, and the reviews summary.
#[derive(Debug, Clone, Default)]
pub struct SearchIndexes {
    pub title: PositionalIndex,
    pub description: PositionalIndex,
    pub features: BTreeMap<String, PresenceIndex>,
    pub reviews: ReviewsIndex,
}

impl SearchIndexes {
    /// Resolve a field name to its index, if built. Title and description
    /// resolve to positional indexes, anything else to a feature index.
    pub fn field_index(&self, field: &str) -> Option<FieldIndex<'_>> {
        match field {
            "title" => Some(FieldIndex::Positional(&self.title)),
            "description" => Some(FieldIndex::Positional(&self.description)),
            other => self.features.get(other).map(FieldIndex::Presence),
        }
    }

    /// The field indexes candidate filtering looks at, in a fixed order:
    /// title, description, then every feature index by name.
    pub fn checked_indexes(&self) -> Vec<FieldIndex<'_>> {
        let mut indexes = vec![
            FieldIndex::Positional(&self.title),
            FieldIndex::Positional(&self.description),
        ];
        indexes.extend(self.features.values().map(FieldIndex::Presence));
        indexes
    }
}
