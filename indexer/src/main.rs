use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::{fmt, EnvFilter};
use vitrine_core::builder::{
    build_doc_store, build_feature_index, build_positional_index, build_reviews_index,
    build_term_index, compute_corpus_stats, unique_features, STAT_FIELDS,
};
use vitrine_core::persist::{
    save_corpus_stats, save_doc_store, save_feature_index, save_meta, save_positional_index,
    save_reviews_index, save_term_index, IndexPaths, MetaFile,
};
use vitrine_core::{Product, Stopwords};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "vitrine-indexer")]
#[command(about = "Build inverted indexes over a product catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every index family from JSON/JSONL catalog files
    Build {
        /// Input path (file or directory of .json/.jsonl files)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        /// Stopword file, one word per line (built-in English list if absent)
        #[arg(long)]
        stopwords: Option<PathBuf>,
        /// Overwrite index files already present in the output directory
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            stopwords,
            overwrite,
        } => build_indexes(&input, &output, stopwords.as_deref(), overwrite),
    }
}

fn build_indexes(
    input: &str,
    output: &str,
    stopword_path: Option<&Path>,
    overwrite: bool,
) -> Result<()> {
    let stopwords = match stopword_path {
        Some(path) => vitrine_core::persist::load_stopwords(path)
            .with_context(|| format!("loading stopwords from {}", path.display()))?,
        None => Stopwords::english(),
    };

    let products = load_corpus(Path::new(input))?;
    tracing::info!(num_docs = products.len(), input, "corpus loaded");

    let paths = IndexPaths::new(output);

    for field in ["title", "description"] {
        let term_index = build_term_index(&products, field, &stopwords);
        save_term_index(&paths, field, &term_index, overwrite)?;
        let positional_index = build_positional_index(&products, field, &stopwords);
        save_positional_index(&paths, field, &positional_index, overwrite)?;
        tracing::info!(field, terms = term_index.terms().count(), "field indexed");
    }

    let features = unique_features(&products);
    for feature in &features {
        let index = build_feature_index(&products, feature, &stopwords);
        if index.is_empty() {
            continue;
        }
        save_feature_index(&paths, feature, &index, overwrite)?;
    }
    tracing::info!(num_features = features.len(), "feature indexes built");

    let reviews = build_reviews_index(&products);
    save_reviews_index(&paths, &reviews, overwrite)?;
    tracing::info!(num_reviewed = reviews.len(), "reviews index built");

    let doc_store = build_doc_store(&products);
    save_doc_store(&paths, &doc_store, overwrite)?;

    let stats = compute_corpus_stats(&products, &STAT_FIELDS, &stopwords);
    save_corpus_stats(&paths, &stats, overwrite)?;

    let meta = MetaFile {
        num_docs: stats.total_documents,
        created_at: time::OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default(),
        version: 1,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output, num_docs = stats.total_documents, "index build complete");
    Ok(())
}

/// Collect catalog records from a JSONL file, a JSON file (array or single
/// object), or a directory of either. A record that fails to parse is logged
/// and skipped; the build never aborts on one bad line.
fn load_corpus(input: &Path) -> Result<Vec<Product>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file()
                && matches!(
                    path.extension().and_then(|s| s.to_str()),
                    Some("json") | Some("jsonl")
                )
            {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
    } else {
        files.push(input.to_path_buf());
    }

    let mut products = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            load_jsonl(&file, &mut products)?;
        } else {
            load_json_file(&file, &mut products)?;
        }
    }
    Ok(products)
}

fn load_jsonl(file: &Path, products: &mut Vec<Product>) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("opening {}", file.display()))?,
    );
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Product>(&line) {
            Ok(product) if !product.url.is_empty() => products.push(product),
            Ok(_) => {
                tracing::warn!(file = %file.display(), line = line_no + 1, "record without url skipped");
            }
            Err(err) => {
                tracing::warn!(file = %file.display(), line = line_no + 1, %err, "malformed record skipped");
            }
        }
    }
    Ok(())
}

fn load_json_file(file: &Path, products: &mut Vec<Product>) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("opening {}", file.display()))?,
    );
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("parsing {}", file.display()))?;
    let records = match json {
        serde_json::Value::Array(records) => records,
        object @ serde_json::Value::Object(_) => vec![object],
        _ => Vec::new(),
    };
    for record in records {
        match serde_json::from_value::<Product>(record) {
            Ok(product) if !product.url.is_empty() => products.push(product),
            Ok(_) => tracing::warn!(file = %file.display(), "record without url skipped"),
            Err(err) => {
                tracing::warn!(file = %file.display(), %err, "malformed record skipped");
            }
        }
    }
    Ok(())
}
