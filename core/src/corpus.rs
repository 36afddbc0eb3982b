use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Documents are identified by their catalog URL.
pub type DocId = String;

/// One raw catalog record as supplied by the crawler/loader. Every field
/// except the URL is optional: a missing or wrong-typed field means "absent",
/// and the record still participates in every index its other fields feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub product_features: BTreeMap<String, String>,
    #[serde(default)]
    pub product_reviews: Vec<Review>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub rating: Option<f64>,
}

/// Display-time record: what the result formatter shows for a hit. Brand and
/// origin are lifted out of `product_features` at build time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocRecord {
    pub title: String,
    pub description: String,
    pub brand: String,
    pub origin: String,
}

/// Document store used to resolve index hits for display and for BM25
/// document lengths. A doc present in an index but missing here is a
/// display-time miss, not an index error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocStore(pub BTreeMap<DocId, DocRecord>);

impl DocStore {
    pub fn get(&self, doc_id: &str) -> Option<&DocRecord> {
        self.0.get(doc_id)
    }

    pub fn insert(&mut self, doc_id: DocId, record: DocRecord) {
        self.0.insert(doc_id, record);
    }

    /// Raw text of one display field, `None` when the doc or field is absent.
    pub fn field_text(&self, doc_id: &str, field: &str) -> Option<&str> {
        let record = self.0.get(doc_id)?;
        match field {
            "title" => Some(record.title.as_str()),
            "description" => Some(record.description.as_str()),
            "brand" => Some(record.brand.as_str()),
            "origin" => Some(record.origin.as_str()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Corpus-level statistics computed from raw text, independent of the
/// indexes: document count and mean token count per field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusStats {
    pub total_documents: usize,
    pub avg_field_length: BTreeMap<String, f64>,
}

impl CorpusStats {
    /// Average field length for BM25 normalization. Falls back to 1.0 for an
    /// unknown field or an empty corpus so the scoring denominator never
    /// divides by zero.
    pub fn avgdl(&self, field: &str) -> f64 {
        match self.avg_field_length.get(field) {
            Some(&avg) if avg > 0.0 => avg,
            _ => 1.0,
        }
    }
}
