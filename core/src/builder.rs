//! Offline index construction.
//!
//! Each document is tokenized independently into a partial term map; partials
//! are combined with [`TermEntry::merge`], which is commutative, so rayon may
//! reduce them in any order and still produce the same postings.

use crate::index::{DocMeta, Index, Posting, TermEntry};
use crate::tokenizer::tokenize;
use crate::DocId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A document as handed to the builder, before it has an id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(alias = "body")]
    pub text: String,
}

#[derive(Default)]
struct Partial {
    documents: BTreeMap<DocId, DocMeta>,
    terms: BTreeMap<String, TermEntry>,
}

impl Partial {
    fn combine(mut self, mut other: Partial) -> Partial {
        if self.terms.len() < other.terms.len() {
            std::mem::swap(&mut self, &mut other);
        }
        self.documents.append(&mut other.documents);
        for (term, entry) in other.terms {
            let merged = match self.terms.remove(&term) {
                Some(existing) => existing.merge(entry),
                None => entry,
            };
            self.terms.insert(term, merged);
        }
        self
    }
}

fn index_document(doc_id: DocId, doc: &SourceDocument) -> Partial {
    let tokens = tokenize(&doc.text);
    let length = tokens.len() as u32;

    let mut positions: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for (term, pos) in tokens {
        positions.entry(term).or_default().push(pos as u32);
    }
    tracing::debug!(doc_id, title = %doc.title, tokens = length, unique = positions.len(), "indexed document");

    let terms = positions
        .into_iter()
        .map(|(term, ps)| (term, TermEntry::single(doc_id, Posting::from_positions(ps))))
        .collect();
    let mut documents = BTreeMap::new();
    documents.insert(doc_id, DocMeta { title: doc.title.clone(), url: doc.url.clone(), length });
    Partial { documents, terms }
}

/// Build an index; document ids are the zero-based positions in `docs`.
pub fn build(docs: &[SourceDocument]) -> Index {
    let partial = docs
        .par_iter()
        .enumerate()
        .map(|(i, doc)| index_document(i as DocId, doc))
        .reduce(Partial::default, Partial::combine);

    let index = Index::from_parts(partial.documents, partial.terms);
    tracing::info!(num_docs = index.doc_count, num_terms = index.num_terms(), avgdl = index.avgdl, "index built");
    index
}
