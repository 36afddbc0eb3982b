use std::collections::BTreeMap;
use tempfile::tempdir;
use vitrine_core::builder::{
    build_doc_store, build_positional_index, build_search_indexes, build_term_index,
    compute_corpus_stats, unique_features, STAT_FIELDS,
};
use vitrine_core::persist::{
    append_query_log, list_feature_indexes, load_corpus_stats, load_doc_store, load_meta,
    load_positional_index, load_search_indexes, load_stopwords, load_synonyms, load_term_index,
    save_corpus_stats, save_doc_store, save_feature_index, save_meta, save_positional_index,
    save_reviews_index, save_term_index, IndexPaths, MetaFile,
};
use vitrine_core::{Product, Review, SearchHit, SearchResults, Stopwords};

fn catalog() -> Vec<Product> {
    let mut wine = Product {
        url: "https://example.com/product/1".to_string(),
        title: Some("Red Wine Vinegar".to_string()),
        description: Some("Sharp red vinegar.".to_string()),
        product_features: BTreeMap::new(),
        product_reviews: vec![Review { rating: Some(4.0) }],
    };
    wine.product_features
        .insert("made in".to_string(), "France".to_string());
    let shoes = Product {
        url: "https://example.com/product/2".to_string(),
        title: Some("Blue Shoes".to_string()),
        description: None,
        product_features: BTreeMap::new(),
        product_reviews: Vec::new(),
    };
    vec![wine, shoes]
}

#[test]
fn indexes_round_trip_through_json() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let stopwords = Stopwords::english();
    let products = catalog();

    let term = build_term_index(&products, "title", &stopwords);
    save_term_index(&paths, "title", &term, false).unwrap();
    assert_eq!(load_term_index(&paths, "title").unwrap(), term);

    let positional = build_positional_index(&products, "title", &stopwords);
    save_positional_index(&paths, "title", &positional, false).unwrap();
    assert_eq!(load_positional_index(&paths, "title").unwrap(), positional);
}

#[test]
fn save_refuses_to_overwrite_unless_asked() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let term = build_term_index(&catalog(), "title", &Stopwords::english());

    save_term_index(&paths, "title", &term, false).unwrap();
    assert!(save_term_index(&paths, "title", &term, false).is_err());
    save_term_index(&paths, "title", &term, true).unwrap();
}

#[test]
fn a_full_index_directory_loads_back_as_built() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let stopwords = Stopwords::english();
    let products = catalog();

    let built = build_search_indexes(&products, &stopwords);
    save_positional_index(&paths, "title", &built.title, false).unwrap();
    save_positional_index(&paths, "description", &built.description, false).unwrap();
    save_reviews_index(&paths, &built.reviews, false).unwrap();
    for (feature, index) in &built.features {
        save_feature_index(&paths, feature, index, false).unwrap();
    }

    let store = build_doc_store(&products);
    save_doc_store(&paths, &store, false).unwrap();
    let stats = compute_corpus_stats(&products, &STAT_FIELDS, &stopwords);
    save_corpus_stats(&paths, &stats, false).unwrap();

    let loaded = load_search_indexes(&paths).unwrap();
    assert_eq!(loaded.title, built.title);
    assert_eq!(loaded.description, built.description);
    assert_eq!(loaded.features, built.features);
    assert_eq!(loaded.reviews.len(), built.reviews.len());

    let feature_names = list_feature_indexes(&paths).unwrap();
    let expected: Vec<String> = unique_features(&products).into_iter().collect();
    assert_eq!(feature_names, expected);

    assert_eq!(load_doc_store(&paths).unwrap().len(), store.len());
    assert_eq!(
        load_corpus_stats(&paths).unwrap().total_documents,
        stats.total_documents
    );
}

#[test]
fn meta_file_round_trips() {
    let dir = tempdir().unwrap();
    let paths = IndexPaths::new(dir.path());
    let meta = MetaFile {
        num_docs: 2,
        created_at: "2026-01-01T00:00:00Z".to_string(),
        version: 1,
    };
    save_meta(&paths, &meta).unwrap();
    let loaded = load_meta(&paths).unwrap();
    assert_eq!(loaded.num_docs, 2);
    assert_eq!(loaded.created_at, "2026-01-01T00:00:00Z");
    assert_eq!(loaded.version, 1);
}

#[test]
fn query_log_ids_auto_increment() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("query_log.json");
    let results = SearchResults {
        total_documents: 2,
        filtered_documents: 1,
        results: vec![SearchHit {
            url: "https://example.com/product/1".to_string(),
            title: "Red Wine Vinegar".to_string(),
            description: "Sharp red vinegar.".to_string(),
            score: 4.2,
        }],
    };

    assert_eq!(append_query_log(&log, "red vinegar", &results).unwrap(), 1);
    assert_eq!(append_query_log(&log, "blue shoes", &results).unwrap(), 2);
    assert_eq!(append_query_log(&log, "hat", &results).unwrap(), 3);
}

#[test]
fn corrupt_query_log_restarts_from_empty() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("query_log.json");
    std::fs::write(&log, "not json at all").unwrap();
    let results = SearchResults {
        total_documents: 0,
        filtered_documents: 0,
        results: Vec::new(),
    };
    assert_eq!(append_query_log(&log, "anything", &results).unwrap(), 1);
}

#[test]
fn stopword_and_synonym_files_load() {
    let dir = tempdir().unwrap();

    let stopword_path = dir.path().join("stopwords.txt");
    std::fs::write(&stopword_path, "the\nand\n\n  of  \n").unwrap();
    let stopwords = load_stopwords(&stopword_path).unwrap();
    assert!(stopwords.contains("the"));
    assert!(stopwords.contains("of"));
    assert_eq!(stopwords.len(), 3);

    let synonyms_path = dir.path().join("synonyms.json");
    std::fs::write(
        &synonyms_path,
        r#"{"france": ["french", "fr"], "usa": ["american"]}"#,
    )
    .unwrap();
    let synonyms = load_synonyms(&synonyms_path).unwrap();
    assert_eq!(synonyms["france"], vec!["french", "fr"]);

    assert!(load_synonyms(&dir.path().join("missing.json")).is_err());
}
