use crate::corpus::{CorpusStats, DocRecord, DocStore, Product};
use crate::index::{PositionalIndex, PresenceIndex, ReviewsIndex, ReviewsSummary, SearchIndexes};
use crate::tokenizer::{tokenize, Stopwords};
use std::collections::BTreeSet;

/// The feature key some catalogs use for country of origin.
const MADE_IN: &str = "made in";

/// Fields with display text and an average-length statistic.
pub const STAT_FIELDS: [&str; 4] = ["title", "description", "brand", "origin"];

/// Canonical feature name used for index files and field weights: lowercase,
/// underscores for spaces, with "made in" folded into "origin".
pub fn canonical_feature_name(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    if lower == MADE_IN {
        "origin".to_string()
    } else {
        lower.replace(' ', "_")
    }
}

fn feature_text<'a>(product: &'a Product, canonical: &str) -> Option<&'a str> {
    product
        .product_features
        .iter()
        .find(|(key, _)| canonical_feature_name(key) == canonical)
        .map(|(_, value)| value.as_str())
}

/// Raw text of a named field: "title"/"description" from the record itself,
/// anything else from `product_features` under its canonical name.
pub fn field_text<'a>(product: &'a Product, field: &str) -> Option<&'a str> {
    match field {
        "title" => product.title.as_deref(),
        "description" => product.description.as_deref(),
        other => feature_text(product, other),
    }
}

/// Term index over one text field: term -> set of doc IDs, deduplicated.
/// Documents missing the field are skipped, never an error.
pub fn build_term_index(products: &[Product], field: &str, stopwords: &Stopwords) -> PresenceIndex {
    let mut index = PresenceIndex::default();
    for product in products {
        if product.url.is_empty() {
            continue;
        }
        let Some(text) = field_text(product, field) else {
            continue;
        };
        for term in tokenize(text, stopwords) {
            index.insert(term, product.url.clone());
        }
    }
    index
}

/// Positional index over one text field: term -> doc -> 0-based positions in
/// encounter order. Same traversal and tokenization as the term index, so
/// the two vocabularies are identical for a given corpus and field.
pub fn build_positional_index(
    products: &[Product],
    field: &str,
    stopwords: &Stopwords,
) -> PositionalIndex {
    let mut index = PositionalIndex::default();
    for product in products {
        if product.url.is_empty() {
            continue;
        }
        let Some(text) = field_text(product, field) else {
            continue;
        };
        for (position, term) in tokenize(text, stopwords).into_iter().enumerate() {
            index.push(term, product.url.clone(), position as u32);
        }
    }
    index
}

/// Presence index over the text value of one named feature (canonical name).
/// Documents lacking the feature are skipped.
pub fn build_feature_index(
    products: &[Product],
    feature: &str,
    stopwords: &Stopwords,
) -> PresenceIndex {
    let mut index = PresenceIndex::default();
    for product in products {
        if product.url.is_empty() {
            continue;
        }
        let Some(text) = feature_text(product, feature) else {
            continue;
        };
        for term in tokenize(text, stopwords) {
            index.insert(term, product.url.clone());
        }
    }
    index
}

/// Reviews summary per document: count, arithmetic mean, and last-in-list
/// rating. Documents with no rated review are skipped.
pub fn build_reviews_index(products: &[Product]) -> ReviewsIndex {
    let mut index = ReviewsIndex::default();
    for product in products {
        if product.url.is_empty() {
            continue;
        }
        let ratings: Vec<f64> = product
            .product_reviews
            .iter()
            .filter_map(|review| review.rating)
            .collect();
        if ratings.is_empty() {
            continue;
        }
        let sum: f64 = ratings.iter().sum();
        index.insert(
            product.url.clone(),
            ReviewsSummary {
                review_count: ratings.len(),
                average_score: sum / ratings.len() as f64,
                latest_score: *ratings.last().expect("non-empty ratings"),
            },
        );
    }
    index
}

/// Display store: title/description plus brand and origin lifted out of the
/// feature map, with empty strings for absent fields.
pub fn build_doc_store(products: &[Product]) -> DocStore {
    let mut store = DocStore::default();
    for product in products {
        if product.url.is_empty() {
            continue;
        }
        store.insert(
            product.url.clone(),
            DocRecord {
                title: product.title.clone().unwrap_or_default(),
                description: product.description.clone().unwrap_or_default(),
                brand: feature_text(product, "brand").unwrap_or_default().to_string(),
                origin: feature_text(product, "origin").unwrap_or_default().to_string(),
            },
        );
    }
    store
}

/// Corpus statistics from raw text, independent of the indexes: unique doc
/// count and mean token count per field. An absent field counts as length 0
/// for its document; an empty corpus gets the biased default of 1.0.
pub fn compute_corpus_stats(
    products: &[Product],
    fields: &[&str],
    stopwords: &Stopwords,
) -> CorpusStats {
    let mut stats = CorpusStats::default();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut totals: Vec<(String, usize)> =
        fields.iter().map(|f| (f.to_string(), 0usize)).collect();

    for product in products {
        if product.url.is_empty() || !seen.insert(product.url.as_str()) {
            continue;
        }
        for (field, total) in totals.iter_mut() {
            let text = field_text(product, field).unwrap_or("");
            *total += tokenize(text, stopwords).len();
        }
    }

    stats.total_documents = seen.len();
    for (field, total) in totals {
        let avg = if stats.total_documents > 0 {
            total as f64 / stats.total_documents as f64
        } else {
            1.0
        };
        stats.avg_field_length.insert(field, avg);
    }
    stats
}

/// All canonical feature names appearing in the corpus.
pub fn unique_features(products: &[Product]) -> BTreeSet<String> {
    products
        .iter()
        .flat_map(|product| product.product_features.keys())
        .map(|key| canonical_feature_name(key))
        .collect()
}

/// Build every index the query pipeline reads, in one pass over the corpus.
pub fn build_search_indexes(products: &[Product], stopwords: &Stopwords) -> SearchIndexes {
    let mut indexes = SearchIndexes {
        title: build_positional_index(products, "title", stopwords),
        description: build_positional_index(products, "description", stopwords),
        reviews: build_reviews_index(products),
        ..SearchIndexes::default()
    };
    for feature in unique_features(products) {
        let index = build_feature_index(products, &feature, stopwords);
        if !index.is_empty() {
            indexes.features.insert(feature, index);
        }
    }
    indexes
}
