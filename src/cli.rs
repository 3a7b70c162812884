use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "folio", version, about = "Offline full-text search for unpacked EPUB books")]
#[command(after_help = "EXAMPLES:
    folio index ./book/OEBPS              Extract and cache the text of a book
    folio search ./book/OEBPS \"white rabbit\"
    folio list                            Show the ids of cached books
    folio forget 6f1c...                  Drop a book's cached text")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (TOML, YAML or JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build (or refresh from cache) the search index of a book directory
    Index {
        /// Directory of chapter documents, in file name order
        dir: PathBuf,

        /// Cache key for the book (defaults to a fingerprint of its contents)
        #[arg(long)]
        book_id: Option<String>,

        /// Extract everything but don't write the cache
        #[arg(long)]
        dry_run: bool,
    },

    /// Search a book directory, indexing it first if needed
    Search {
        /// Directory of chapter documents, in file name order
        dir: PathBuf,

        /// Text to look for (case-insensitive)
        query: String,

        /// Cache key for the book (defaults to a fingerprint of its contents)
        #[arg(long)]
        book_id: Option<String>,

        /// Maximum number of chapters to list
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// List the ids of cached books, most recently indexed first
    List,

    /// Delete the cached text of a book
    Forget {
        /// Cache key printed by `folio index`
        book_id: String,
    },
}
