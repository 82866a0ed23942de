use crate::{DocId, IndexError, InvertedIndex, TermId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

/// Locations of the line-oriented index files.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub postings: PathBuf,
    pub terms: PathBuf,
    pub documents: PathBuf,
    pub meta: PathBuf,
}

impl IndexPaths {
    pub fn in_dir<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            postings: root.join("index.bin"),
            terms: root.join("termid_map.bin"),
            documents: root.join("docid_map.bin"),
            meta: root.join("meta.json"),
        }
    }
}

/// `docid:documentPath`. The path may itself contain `:`.
pub fn parse_document_line(line: &str) -> Option<(DocId, String)> {
    let (doc_id, path) = line.split_once(':')?;
    Some((doc_id.trim().parse().ok()?, path.to_string()))
}

/// `termText:termId`. The term may itself contain `:`.
pub fn parse_term_line(line: &str) -> Option<(String, TermId)> {
    let (term, term_id) = line.rsplit_once(':')?;
    Some((term.to_string(), term_id.trim().parse().ok()?))
}

/// `termId:docid,docid,...,docid`
pub fn parse_postings_line(line: &str) -> Option<(TermId, Vec<DocId>)> {
    let (term_id, list) = line.split_once(':')?;
    let term_id = term_id.trim().parse().ok()?;
    let postings = list
        .split(',')
        .map(|d| d.trim().parse::<DocId>().ok())
        .collect::<Option<Vec<_>>>()?;
    Some((term_id, postings))
}

fn malformed(path: &Path, line_no: usize, line: &str) -> anyhow::Error {
    tracing::warn!(file = %path.display(), line_no, line, "unable to parse index line");
    IndexError::MalformedLine { file: path.display().to_string(), line_no, line: line.to_string() }.into()
}

fn read_map<K, V>(path: &Path, parse: fn(&str) -> Option<(K, V)>) -> Result<Vec<(K, V)>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        match parse(&line) {
            Some(entry) => entries.push(entry),
            None => return Err(malformed(path, idx + 1, &line)),
        }
    }
    Ok(entries)
}

pub fn read_documents(path: &Path) -> Result<BTreeMap<DocId, String>> {
    Ok(read_map(path, parse_document_line)?.into_iter().collect())
}

pub fn read_terms(path: &Path) -> Result<HashMap<String, TermId>> {
    Ok(read_map(path, parse_term_line)?.into_iter().collect())
}

/// Read posting lists until the first blank line or end of file. A non-blank
/// line that does not parse aborts the load.
pub fn read_postings(path: &Path) -> Result<HashMap<TermId, Vec<DocId>>> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut postings = HashMap::new();
    for (idx, line) in BufReader::new(f).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() { break; }
        let (term_id, list) = parse_postings_line(line).ok_or_else(|| malformed(path, idx + 1, line))?;
        postings.insert(term_id, list);
    }
    Ok(postings)
}

pub fn write_documents(path: &Path, documents: &BTreeMap<DocId, String>) -> Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    for (doc_id, doc_path) in documents {
        writeln!(f, "{doc_id}:{doc_path}")?;
    }
    f.flush()?;
    Ok(())
}

pub fn write_terms(path: &Path, terms: &HashMap<String, TermId>) -> Result<()> {
    let mut entries: Vec<(&String, &TermId)> = terms.iter().collect();
    entries.sort_by_key(|(_, id)| **id);
    let mut f = BufWriter::new(File::create(path)?);
    for (term, term_id) in entries {
        writeln!(f, "{term}:{term_id}")?;
    }
    f.flush()?;
    Ok(())
}

/// Posting lists in ascending term id order, closed by a blank line.
pub fn write_postings(path: &Path, postings: &HashMap<TermId, Vec<DocId>>) -> Result<()> {
    let mut term_ids: Vec<&TermId> = postings.keys().collect();
    term_ids.sort();
    let mut f = BufWriter::new(File::create(path)?);
    for term_id in term_ids {
        let list = postings[term_id].iter().map(|d| d.to_string()).collect::<Vec<_>>().join(",");
        writeln!(f, "{term_id}:{list}")?;
    }
    writeln!(f)?;
    f.flush()?;
    Ok(())
}

pub fn save_meta(path: &Path, meta: &MetaFile) -> Result<()> {
    if let Some(parent) = path.parent() { create_dir_all(parent)?; }
    let mut f = File::create(path)?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(path: &Path) -> Result<MetaFile> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Write the three index files for `index`, creating parent directories as needed.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    for p in [&paths.postings, &paths.terms, &paths.documents] {
        if let Some(parent) = p.parent() { create_dir_all(parent)?; }
    }
    write_documents(&paths.documents, index.documents())?;
    write_terms(&paths.terms, index.terms())?;
    write_postings(&paths.postings, index.posting_lists())?;
    Ok(())
}

/// Load the document map, term map and posting lists into an index.
pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    let documents = read_documents(&paths.documents)?;
    let terms = read_terms(&paths.terms)?;
    let postings = read_postings(&paths.postings)?;
    let index = InvertedIndex::from_tables(documents, terms, postings)?;
    tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "index loaded");
    Ok(index)
}
