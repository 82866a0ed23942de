use anyhow::{Context, Result};
use boolsearch_core::persist::{load_index, save_index, save_meta, IndexPaths, MetaFile};
use boolsearch_core::tokenizer::tokenize;
use boolsearch_core::{IndexBuilder, InvertedIndex, QueryEngine};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build, inspect and query a boolean inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index files from a directory of plain-text documents
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
    },
    /// Print documents and posting lists
    Dump {
        #[command(flatten)]
        index: IndexArgs,
    },
    /// Run boolean queries and print the matching documents
    Query {
        #[command(flatten)]
        index: IndexArgs,
        /// Queries such as "Caesar AND NOT (Brutus OR Calpurnia)"
        #[arg(required = true)]
        queries: Vec<String>,
    },
}

#[derive(Args)]
struct IndexArgs {
    /// Index directory
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// Posting list file, overrides <index>/index.bin
    #[arg(long)]
    postings: Option<PathBuf>,
    /// Term map file, overrides <index>/termid_map.bin
    #[arg(long)]
    terms: Option<PathBuf>,
    /// Document map file, overrides <index>/docid_map.bin
    #[arg(long)]
    documents: Option<PathBuf>,
}

impl IndexArgs {
    fn paths(&self) -> IndexPaths {
        let mut paths = IndexPaths::in_dir(&self.index);
        if let Some(p) = &self.postings { paths.postings = p.clone(); }
        if let Some(p) = &self.terms { paths.terms = p.clone(); }
        if let Some(p) = &self.documents { paths.documents = p.clone(); }
        paths
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(&input, &output),
        Commands::Dump { index } => {
            let index = load_index(&index.paths())?;
            let stdout = io::stdout();
            index.dump(&mut stdout.lock())?;
            Ok(())
        }
        Commands::Query { index, queries } => {
            let index = load_index(&index.paths())?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for query in &queries {
                print_query(&index, query, &mut out)?;
            }
            Ok(())
        }
    }
}

fn collect_files(input: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            if entry.path().is_file() {
                files.push(entry.path().to_path_buf());
            }
        }
    } else if input.is_file() {
        files.push(input.to_path_buf());
    }
    files
}

fn build_index(input: &Path, output: &Path) -> Result<()> {
    let out_paths = IndexPaths::in_dir(output);
    fs::create_dir_all(output)?;

    let mut builder = IndexBuilder::new();
    for file in collect_files(input) {
        let text = match fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "skipping unreadable document");
                continue;
            }
        };
        let doc_id = builder.add_document(file.display().to_string(), tokenize(&text));
        tracing::debug!(doc_id, file = %file.display(), "indexed document");
    }

    let index = builder.build()?;
    tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "ingested documents");

    save_index(&out_paths, &index).context("writing index files")?;
    let meta = MetaFile {
        num_docs: index.num_docs() as u32,
        num_terms: index.num_terms() as u32,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: 1,
    };
    save_meta(&out_paths.meta, &meta)?;

    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}

fn print_query<W: Write>(index: &InvertedIndex, query: &str, out: &mut W) -> Result<()> {
    match QueryEngine::new(index).execute(query) {
        Err(e) => {
            tracing::error!(query, error = %e, "query failed");
            writeln!(out, "Error while executing query.")?;
        }
        Ok(docs) if docs.is_empty() => writeln!(out, "No documents match '{query}'")?,
        Ok(docs) => {
            writeln!(out, "Documents matching '{query}':")?;
            for doc_id in docs {
                let path = index.document(doc_id).unwrap_or("?");
                writeln!(out, "{doc_id:2} -> {path}")?;
            }
        }
    }
    Ok(())
}
