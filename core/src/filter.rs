use crate::corpus::DocId;
use crate::index::SearchIndexes;
use crate::tokenizer::Stopwords;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Union filtering: a document's count goes up by one for every
/// (term, field) pair that hits it, across title, description and every
/// feature index. Documents with zero matches are absent from the result.
pub fn filter_any(terms: &BTreeSet<String>, indexes: &SearchIndexes) -> HashMap<DocId, u32> {
    let mut matched: HashMap<DocId, u32> = HashMap::new();
    let checked = indexes.checked_indexes();
    for term in terms {
        for field_index in &checked {
            for doc_id in field_index.doc_ids(term) {
                *matched.entry(doc_id.clone()).or_insert(0) += 1;
            }
        }
    }
    matched
}

/// Intersection filtering: only documents containing every query term (in
/// any checked field) survive, each with a count equal to the number of
/// distinct terms. Stopwords are stripped from the term set first, so a
/// synonym-introduced stopword cannot empty the intersection; an
/// all-stopword query matches nothing under this policy. Any term with zero
/// matching documents short-circuits to an empty result.
pub fn filter_all(
    terms: &BTreeSet<String>,
    indexes: &SearchIndexes,
    stopwords: &Stopwords,
) -> HashMap<DocId, u32> {
    let reduced: Vec<&String> = terms.iter().filter(|t| !stopwords.contains(t)).collect();
    if reduced.is_empty() {
        return HashMap::new();
    }

    let checked = indexes.checked_indexes();
    let mut surviving: Option<HashSet<&DocId>> = None;
    for term in &reduced {
        let mut docs_for_term: HashSet<&DocId> = HashSet::new();
        for field_index in &checked {
            docs_for_term.extend(field_index.doc_ids(term));
        }
        if docs_for_term.is_empty() {
            return HashMap::new();
        }
        surviving = Some(match surviving {
            None => docs_for_term,
            Some(acc) => acc.intersection(&docs_for_term).copied().collect(),
        });
    }

    surviving
        .unwrap_or_default()
        .into_iter()
        .map(|doc_id| (doc_id.clone(), reduced.len() as u32))
        .collect()
}
