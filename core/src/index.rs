use crate::error::IndexError;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

pub type TermId = u32;
pub type DocId = u32;

/// Term id reserved for "not in the dictionary". Never assigned to a real term,
/// so it never has a posting list.
pub const UNKNOWN_TERM: TermId = 0;

/// Read-only in-memory inverted index. Built once, then only borrowed by queries.
#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    documents: BTreeMap<DocId, String>,
    terms: HashMap<String, TermId>,
    term_names: HashMap<TermId, String>,
    postings: HashMap<TermId, Vec<DocId>>, // ascending, duplicate-free
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Assemble an index from its three tables, checking the invariants the
    /// evaluator relies on.
    pub fn from_tables(
        documents: BTreeMap<DocId, String>,
        terms: HashMap<String, TermId>,
        postings: HashMap<TermId, Vec<DocId>>,
    ) -> Result<Self, IndexError> {
        let mut term_names = HashMap::with_capacity(terms.len());
        for (term, &term_id) in &terms {
            if term_id == UNKNOWN_TERM {
                return Err(IndexError::ReservedTermId { term: term.clone() });
            }
            term_names.insert(term_id, term.clone());
        }
        for (&term_id, list) in &postings {
            if term_id == UNKNOWN_TERM {
                return Err(IndexError::ReservedTermId { term: "<postings>".into() });
            }
            if list.windows(2).any(|w| w[0] >= w[1]) {
                return Err(IndexError::UnsortedPostings { term_id });
            }
            if let Some(&doc_id) = list.iter().find(|d| !documents.contains_key(*d)) {
                return Err(IndexError::UnknownDocument { term_id, doc_id });
            }
        }
        Ok(Self { documents, terms, term_names, postings })
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> { self.terms.get(term).copied() }

    pub fn term_name(&self, term_id: TermId) -> Option<&str> { self.term_names.get(&term_id).map(String::as_str) }

    pub fn postings(&self, term_id: TermId) -> Option<&[DocId]> { self.postings.get(&term_id).map(Vec::as_slice) }

    pub fn document(&self, doc_id: DocId) -> Option<&str> { self.documents.get(&doc_id).map(String::as_str) }

    pub fn num_docs(&self) -> usize { self.documents.len() }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    /// All known document ids, ascending.
    pub fn universe(&self) -> Vec<DocId> { self.documents.keys().copied().collect() }

    pub fn documents(&self) -> &BTreeMap<DocId, String> { &self.documents }

    pub fn terms(&self) -> &HashMap<String, TermId> { &self.terms }

    pub fn posting_lists(&self) -> &HashMap<TermId, Vec<DocId>> { &self.postings }

    /// Resolve document ids to their paths, skipping ids the table does not know.
    pub fn documents_for_ids(&self, doc_ids: &[DocId]) -> Vec<&str> {
        doc_ids.iter().filter_map(|id| self.document(*id)).collect()
    }

    pub fn dump<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Inverted index:")?;
        writeln!(out, "Documents:")?;
        for (doc_id, path) in &self.documents {
            writeln!(out, "{doc_id} -> {path}")?;
        }
        writeln!(out, "Posting lists:")?;
        let mut term_ids: Vec<&TermId> = self.postings.keys().collect();
        term_ids.sort();
        for term_id in term_ids {
            let name = self.term_name(*term_id).unwrap_or("?");
            writeln!(out, "{term_id}({name}) -> {:?}", self.postings[term_id])?;
        }
        Ok(())
    }
}

/// Accumulates documents into index tables. Document ids are handed out from 1
/// in insertion order and term ids from 1 in first-seen order, so posting lists
/// stay ascending without a sort.
#[derive(Debug)]
pub struct IndexBuilder {
    documents: BTreeMap<DocId, String>,
    terms: HashMap<String, TermId>,
    postings: HashMap<TermId, Vec<DocId>>,
    next_doc_id: DocId,
    next_term_id: TermId,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self {
            documents: BTreeMap::new(),
            terms: HashMap::new(),
            postings: HashMap::new(),
            next_doc_id: 1,
            next_term_id: UNKNOWN_TERM + 1,
        }
    }
}

impl IndexBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn add_document<I, S>(&mut self, path: impl Into<String>, tokens: I) -> DocId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let doc_id = self.next_doc_id;
        self.next_doc_id += 1;
        self.documents.insert(doc_id, path.into());

        for token in tokens {
            let next_term_id = &mut self.next_term_id;
            let term_id = *self.terms.entry(token.into()).or_insert_with(|| {
                let id = *next_term_id;
                *next_term_id += 1;
                id
            });
            let list = self.postings.entry(term_id).or_default();
            if list.last() != Some(&doc_id) {
                list.push(doc_id);
            }
        }
        doc_id
    }

    pub fn build(self) -> Result<InvertedIndex, IndexError> {
        InvertedIndex::from_tables(self.documents, self.terms, self.postings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_assigns_ids_from_one() {
        let mut b = IndexBuilder::new();
        let d1 = b.add_document("a.txt", ["Caesar", "Brutus", "Caesar"]);
        let d2 = b.add_document("b.txt", ["Caesar"]);
        let index = b.build().unwrap();

        assert_eq!((d1, d2), (1, 2));
        assert_eq!(index.term_id("Caesar"), Some(1));
        assert_eq!(index.term_id("Brutus"), Some(2));
        assert_eq!(index.postings(1), Some(&[1, 2][..]));
        assert_eq!(index.postings(2), Some(&[1][..]));
        assert_eq!(index.term_name(2), Some("Brutus"));
    }

    #[test]
    fn rejects_reserved_term_id() {
        let terms = HashMap::from([("zero".to_string(), 0)]);
        let err = InvertedIndex::from_tables(BTreeMap::new(), terms, HashMap::new()).unwrap_err();
        assert!(matches!(err, IndexError::ReservedTermId { .. }));
    }

    #[test]
    fn rejects_unsorted_postings() {
        let terms = HashMap::from([("x".to_string(), 1)]);
        let postings = HashMap::from([(1, vec![3, 1])]);
        let err = InvertedIndex::from_tables(BTreeMap::new(), terms, postings).unwrap_err();
        assert!(matches!(err, IndexError::UnsortedPostings { term_id: 1 }));
    }

    #[test]
    fn rejects_postings_for_unknown_documents() {
        let documents = BTreeMap::from([(1, "one".to_string()), (2, "two".to_string())]);
        let terms = HashMap::from([("x".to_string(), 1)]);
        let postings = HashMap::from([(1, vec![1, 7])]);
        let err = InvertedIndex::from_tables(documents, terms, postings).unwrap_err();
        assert!(matches!(err, IndexError::UnknownDocument { term_id: 1, doc_id: 7 }));
    }

    #[test]
    fn documents_for_ids_skips_unknown() {
        let mut b = IndexBuilder::new();
        b.add_document("one", ["x"]);
        let index = b.build().unwrap();
        assert_eq!(index.documents_for_ids(&[1, 9]), vec!["one"]);
    }

    #[test]
    fn dump_lists_documents_and_postings() {
        let mut b = IndexBuilder::new();
        b.add_document("one", ["x"]);
        let index = b.build().unwrap();
        let mut out = Vec::new();
        index.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1 -> one"));
        assert!(text.contains("1(x) -> [1]"));
    }
}
