use std::collections::BTreeMap;
use vitrine_core::builder::{
    build_doc_store, build_feature_index, build_positional_index, build_reviews_index,
    build_term_index, canonical_feature_name, compute_corpus_stats, unique_features, STAT_FIELDS,
};
use vitrine_core::{Product, Review, Stopwords};

fn product(url: &str, title: &str, description: &str) -> Product {
    Product {
        url: url.to_string(),
        title: Some(title.to_string()),
        description: Some(description.to_string()),
        product_features: BTreeMap::new(),
        product_reviews: Vec::new(),
    }
}

fn catalog() -> Vec<Product> {
    let mut wine = product(
        "https://example.com/product/1",
        "Red Wine Vinegar",
        "A sharp red vinegar made from French wine.",
    );
    wine.product_features
        .insert("made in".to_string(), "France".to_string());
    wine.product_features
        .insert("brand".to_string(), "Maille".to_string());
    wine.product_reviews = vec![
        Review { rating: Some(3.0) },
        Review { rating: Some(5.0) },
        Review { rating: Some(4.0) },
    ];

    let mut shoes = product(
        "https://example.com/product/2",
        "Blue Running Shoes",
        "Lightweight running shoes.",
    );
    shoes
        .product_features
        .insert("brand".to_string(), "Zoomfly".to_string());

    // No description, no features, unrated review
    let mut hat = Product {
        url: "https://example.com/product/3".to_string(),
        title: Some("Red Hat".to_string()),
        description: None,
        product_features: BTreeMap::new(),
        product_reviews: vec![Review { rating: None }],
    };
    hat.product_features
        .insert("colors".to_string(), "red".to_string());

    vec![wine, shoes, hat]
}

#[test]
fn term_and_positional_indexes_share_a_vocabulary() {
    let products = catalog();
    let stopwords = Stopwords::english();
    let term = build_term_index(&products, "description", &stopwords);
    let positional = build_positional_index(&products, "description", &stopwords);

    let term_vocab: Vec<&String> = term.terms().collect();
    let positional_vocab: Vec<&String> = positional.terms().collect();
    assert_eq!(term_vocab, positional_vocab);
    assert!(!term_vocab.is_empty());
}

#[test]
fn positional_index_records_positions_in_encounter_order() {
    let products = vec![product("u1", "red shoes red laces", "")];
    let index = build_positional_index(&products, "title", &Stopwords::none());
    assert_eq!(index.postings("red").unwrap()["u1"], vec![0, 2]);
    assert_eq!(index.tf("red", "u1"), 2);
    assert_eq!(index.tf("shoes", "u1"), 1);
    assert_eq!(index.tf("missing", "u1"), 0);
}

#[test]
fn term_index_deduplicates_per_document() {
    let products = vec![product("u1", "red red red", "")];
    let index = build_term_index(&products, "title", &Stopwords::none());
    assert_eq!(index.df("red"), 1);
}

#[test]
fn docs_missing_a_field_are_skipped_not_fatal() {
    let products = catalog();
    let index = build_term_index(&products, "description", &Stopwords::english());
    // the hat has no description
    assert!(!index.contains("red", "https://example.com/product/3"));
    // the other two are present
    assert!(index.contains("vinegar", "https://example.com/product/1"));
    assert!(index.contains("lightweight", "https://example.com/product/2"));
}

#[test]
fn feature_index_covers_only_products_with_the_feature() {
    let products = catalog();
    let index = build_feature_index(&products, "brand", &Stopwords::english());
    assert!(index.contains("maille", "https://example.com/product/1"));
    assert!(index.contains("zoomfly", "https://example.com/product/2"));
    assert_eq!(index.df("maille"), 1);
    assert!(!index.contains("maille", "https://example.com/product/3"));
}

#[test]
fn made_in_is_canonicalized_to_origin() {
    assert_eq!(canonical_feature_name("made in"), "origin");
    assert_eq!(canonical_feature_name("Care Instructions"), "care_instructions");

    let products = catalog();
    let features = unique_features(&products);
    assert!(features.contains("origin"));
    assert!(features.contains("brand"));
    assert!(!features.contains("made in"));

    let origin = build_feature_index(&products, "origin", &Stopwords::english());
    assert!(origin.contains("france", "https://example.com/product/1"));
}

#[test]
fn reviews_summary_counts_mean_and_latest() {
    let products = catalog();
    let reviews = build_reviews_index(&products);

    let summary = reviews.summary("https://example.com/product/1").unwrap();
    assert_eq!(summary.review_count, 3);
    assert_eq!(summary.average_score, 4.0);
    assert_eq!(summary.latest_score, 4.0);

    // no rated review: skipped entirely
    assert!(reviews.summary("https://example.com/product/2").is_none());
    assert!(reviews.summary("https://example.com/product/3").is_none());
    assert_eq!(reviews.average_score("https://example.com/product/2"), 0.0);
}

#[test]
fn doc_store_lifts_brand_and_origin() {
    let store = build_doc_store(&catalog());
    let record = store.get("https://example.com/product/1").unwrap();
    assert_eq!(record.brand, "Maille");
    assert_eq!(record.origin, "France");
    assert_eq!(record.title, "Red Wine Vinegar");

    let hat = store.get("https://example.com/product/3").unwrap();
    assert_eq!(hat.description, "");
}

#[test]
fn corpus_stats_average_raw_token_counts() {
    let products = vec![
        product("u1", "red shoes", ""),
        product("u2", "blue suede running shoes", ""),
    ];
    let stats = compute_corpus_stats(&products, &STAT_FIELDS, &Stopwords::none());
    assert_eq!(stats.total_documents, 2);
    assert_eq!(stats.avgdl("title"), 3.0);
    // no doc has a brand: the biased default keeps scoring divisions safe
    assert_eq!(stats.avgdl("brand"), 1.0);
}

#[test]
fn empty_corpus_gets_biased_defaults() {
    let stats = compute_corpus_stats(&[], &STAT_FIELDS, &Stopwords::english());
    assert_eq!(stats.total_documents, 0);
    assert_eq!(stats.avgdl("title"), 1.0);
    assert_eq!(stats.avgdl("nonexistent"), 1.0);
}

#[test]
fn duplicate_urls_count_once() {
    let products = vec![product("u1", "red", ""), product("u1", "red", "")];
    let stats = compute_corpus_stats(&products, &STAT_FIELDS, &Stopwords::none());
    assert_eq!(stats.total_documents, 1);
}
