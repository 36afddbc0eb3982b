use std::collections::{BTreeMap, BTreeSet};

/// Flat synonym configuration: canonical term -> equivalent terms. Loaded
/// whole by the persistence layer and passed through opaquely.
pub type SynonymTable = BTreeMap<String, Vec<String>>;

/// Expand query terms with configured synonyms. Expansion only adds: the
/// output always contains the original terms. Order is not significant.
pub fn expand_query(tokens: &[String], synonyms: &SynonymTable) -> BTreeSet<String> {
    let mut expanded: BTreeSet<String> = tokens.iter().cloned().collect();
    for token in tokens {
        if let Some(equivalents) = synonyms.get(token) {
            expanded.extend(equivalents.iter().cloned());
        }
    }
    expanded
}
