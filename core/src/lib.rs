//! Core of the vitrine product-catalog search engine: tokenization, batch
//! index construction, synonym expansion, candidate filtering, multi-field
//! BM25 ranking, and the query orchestrator. Index and query-log persistence
//! live in [`persist`]; network and file loading belong to the indexer,
//! server and crawler binaries.

pub mod builder;
pub mod corpus;
pub mod expand;
pub mod filter;
pub mod index;
pub mod persist;
pub mod rank;
pub mod search;
pub mod tokenizer;

pub use corpus::{CorpusStats, DocId, DocRecord, DocStore, Product, Review};
pub use expand::{expand_query, SynonymTable};
pub use filter::{filter_all, filter_any};
pub use index::{
    FieldIndex, PositionalIndex, PresenceIndex, ReviewsIndex, ReviewsSummary, SearchIndexes,
};
pub use rank::{
    compute_bm25, compute_linear_score, default_field_weights, rank_documents, Bm25Params,
    FieldWeights, RankWeights,
};
pub use search::{FilterMode, SearchConfig, SearchHit, SearchResults, Searcher};
pub use tokenizer::{tokenize, Stopwords};
