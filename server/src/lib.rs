use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use vitrine_core::persist::{
    append_query_log, load_corpus_stats, load_doc_store, load_search_indexes, load_synonyms,
    IndexPaths,
};
use vitrine_core::{FilterMode, SearchConfig, Searcher};

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    /// Filter policy: "any" (default) or "all".
    pub mode: Option<String>,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize {
    10
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: String,
    pub took_s: f64,
    pub total_documents: usize,
    pub filtered_documents: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub description: String,
    pub score: f64,
}

#[derive(Deserialize)]
pub struct DocParams {
    pub url: String,
}

#[derive(Clone)]
pub struct AppState {
    pub searcher: Arc<Searcher>,
    /// Query log path behind a lock: appends are read-modify-write.
    pub query_log: Option<Arc<Mutex<PathBuf>>>,
}

pub fn build_app(
    index_dir: &str,
    synonyms_path: Option<&Path>,
    query_log: Option<PathBuf>,
) -> Result<Router> {
    // Load everything the query pipeline reads at startup; queries only read.
    let paths = IndexPaths::new(index_dir);
    let indexes = load_search_indexes(&paths)
        .with_context(|| format!("loading indexes from {index_dir}"))?;
    let doc_store = load_doc_store(&paths)?;
    let stats = load_corpus_stats(&paths)?;

    let mut config = SearchConfig::default();
    if let Some(path) = synonyms_path {
        config.synonyms = load_synonyms(path)
            .with_context(|| format!("loading synonyms from {}", path.display()))?;
    }

    let searcher = Searcher::new(indexes, doc_store, stats, config);
    tracing::info!(
        index_dir,
        num_docs = searcher.stats.total_documents,
        num_features = searcher.indexes.features.len(),
        "index loaded"
    );

    let app_state = AppState {
        searcher: Arc::new(searcher),
        query_log: query_log.map(|path| Arc::new(Mutex::new(path))),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc", get(doc_handler))
        .with_state(app_state)
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let start = std::time::Instant::now();

    // Unknown modes are a configuration error, not a silent fallback
    let mode = match params.mode.as_deref() {
        None => FilterMode::Any,
        Some(raw) => FilterMode::from_str(raw)
            .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?,
    };

    let results = state.searcher.search(&params.q, mode);

    if let Some(log) = &state.query_log {
        let path = log.lock();
        if let Err(err) = append_query_log(&path, &params.q, &results) {
            tracing::warn!(%err, "query log append failed");
        }
    }

    let raw_terms: Vec<String> = params.q.split_whitespace().map(str::to_string).collect();
    let k = params.k.clamp(1, 100);
    let hits = results
        .results
        .iter()
        .take(k)
        .map(|hit| SearchHit {
            url: hit.url.clone(),
            title: hit.title.clone(),
            description: highlight_terms(&hit.description, &raw_terms),
            score: hit.score,
        })
        .collect();

    Ok(Json(SearchResponse {
        query: params.q,
        mode: mode.to_string(),
        took_s: start.elapsed().as_secs_f64(),
        total_documents: results.total_documents,
        filtered_documents: results.filtered_documents,
        results: hits,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Query(params): Query<DocParams>,
) -> Json<serde_json::Value> {
    if let Some(record) = state.searcher.doc_store.get(&params.url) {
        let mut obj = serde_json::json!({
            "url": params.url,
            "title": record.title,
            "description": record.description,
            "brand": record.brand,
            "origin": record.origin,
        });
        if let Some(summary) = state.searcher.indexes.reviews.summary(&params.url) {
            obj["reviews"] = serde_json::json!({
                "review_count": summary.review_count,
                "average_score": summary.average_score,
                "latest_score": summary.latest_score,
            });
        }
        return Json(obj);
    }
    Json(serde_json::json!({ "error": "not found" }))
}

/// Wrap case-insensitive occurrences of the raw query terms in <em> tags.
fn highlight_terms(text: &str, terms: &[String]) -> String {
    let mut highlighted = text.to_string();
    for term in terms {
        if term.trim().is_empty() {
            continue;
        }
        let Ok(pattern) = regex::RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
        else {
            continue;
        };
        highlighted = pattern
            .replace_all(&highlighted, |caps: &regex::Captures| {
                format!("<em>{}</em>", &caps[0])
            })
            .to_string();
    }
    highlighted
}
