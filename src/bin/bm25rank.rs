//! `bm25rank` CLI: rank a corpus file against a query.

#[cfg(feature = "cli")]
use bm25rank::bm25::{Bm25Params, Bm25Scorer, IdfVariant, DEFAULT_K1, PUBLIC_DEFAULT_B};
#[cfg(feature = "cli")]
use bm25rank::{Cancellation, Ranker, Ranking, Tokenizer, UnicodeTokenizer, WhitespaceTokenizer};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::time::Duration;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(author, version, about = "BM25 ranking CLI", long_about = None)]
struct Args {
    /// Log progress to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank the documents of a corpus file against a query.
    Search {
        /// Corpus file.
        #[arg(short, long)]
        input: PathBuf,

        /// Corpus layout.
        #[arg(long, value_enum, default_value_t = CorpusFormat::Lines)]
        format: CorpusFormat,

        /// Number of results to return.
        #[arg(short = 'n', long, default_value_t = 10)]
        top_n: usize,

        /// Term-frequency saturation (>= 0).
        #[arg(long, default_value_t = DEFAULT_K1)]
        k1: f64,

        /// Length normalization (0..=1).
        #[arg(long, default_value_t = PUBLIC_DEFAULT_B)]
        b: f64,

        /// IDF formula.
        #[arg(long, value_enum, default_value_t = IdfChoice::Reference)]
        idf: IdfChoice,

        /// Tokenizer applied to the query and every document.
        #[arg(long, value_enum, default_value_t = TokenizerChoice::Unicode)]
        tokenizer: TokenizerChoice,

        /// Give up after this many milliseconds.
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Print results as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Query text.
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Print the terms a tokenizer produces, one per line.
    Tokenize {
        /// Tokenizer to run.
        #[arg(long, value_enum, default_value_t = TokenizerChoice::Unicode)]
        tokenizer: TokenizerChoice,

        /// Text to tokenize.
        #[arg(required = true)]
        text: Vec<String>,
    },
}

#[cfg(feature = "cli")]
#[derive(ValueEnum, Clone, Copy, Debug)]
enum CorpusFormat {
    /// One document per line; the id is the zero-based line number.
    Lines,
    /// `id<TAB>text` per line.
    Tsv,
}

#[cfg(feature = "cli")]
#[derive(ValueEnum, Clone, Copy, Debug)]
enum IdfChoice {
    /// ln((N + 0.5) / (df + 0.5))
    Reference,
    /// ln((N - df + 0.5) / (df + 0.5)), may be negative
    Rsj,
}

#[cfg(feature = "cli")]
impl From<IdfChoice> for IdfVariant {
    fn from(choice: IdfChoice) -> Self {
        match choice {
            IdfChoice::Reference => IdfVariant::Reference,
            IdfChoice::Rsj => IdfVariant::RobertsonSparckJones,
        }
    }
}

#[cfg(feature = "cli")]
#[derive(ValueEnum, Clone, Copy, Debug)]
enum TokenizerChoice {
    /// Unicode word boundaries.
    Unicode,
    /// Whitespace only.
    Whitespace,
    /// Chinese dictionary segmentation.
    #[cfg(feature = "jieba")]
    Jieba,
}

#[cfg(feature = "cli")]
#[derive(serde::Serialize)]
struct JsonOutput<'a> {
    query: &'a str,
    results: Vec<JsonResult<'a>>,
}

#[cfg(feature = "cli")]
#[derive(serde::Serialize)]
struct JsonResult<'a> {
    id: &'a str,
    score: f64,
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info,bm25rank=debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn load_corpus(
    path: &Path,
    format: CorpusFormat,
) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let mut docs = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match format {
            CorpusFormat::Lines => docs.push((i.to_string(), line.to_string())),
            CorpusFormat::Tsv => {
                let (id, body) = line.split_once('\t').ok_or_else(|| {
                    format!("{}:{}: expected `id<TAB>text`", path.display(), i + 1)
                })?;
                docs.push((id.to_string(), body.to_string()));
            }
        }
    }
    tracing::info!(path = %path.display(), docs = docs.len(), "loaded corpus");
    Ok(docs)
}

#[cfg(feature = "cli")]
fn search_with<T: Tokenizer>(
    tokenizer: T,
    scorer: Bm25Scorer,
    query: &str,
    docs: &[(String, String)],
    top_n: usize,
    cancel: &Cancellation,
) -> Result<Ranking, bm25rank::Error> {
    let pairs = docs.iter().map(|(id, text)| (id.as_str(), text.as_str()));
    Ranker::new(tokenizer, scorer).rank_with(query, pairs, top_n, cancel)
}

#[cfg(feature = "cli")]
fn tokenize_with<T: Tokenizer>(
    tokenizer: T,
    text: &str,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    Ok(tokenizer.tokenize(text).map_err(|e| e.to_string())?)
}

#[cfg(feature = "cli")]
fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        Commands::Search {
            input,
            format,
            top_n,
            k1,
            b,
            idf,
            tokenizer,
            timeout_ms,
            json,
            query,
        } => {
            let scorer = Bm25Scorer::with_params(Bm25Params::new(k1, b).with_idf(idf.into()))?;
            let docs = load_corpus(&input, format)?;
            let query = query.join(" ");
            let cancel = match timeout_ms {
                Some(ms) => Cancellation::after(Duration::from_millis(ms)),
                None => Cancellation::none(),
            };

            let ranking = match tokenizer {
                TokenizerChoice::Unicode => {
                    search_with(UnicodeTokenizer::new(), scorer, &query, &docs, top_n, &cancel)?
                }
                TokenizerChoice::Whitespace => {
                    search_with(WhitespaceTokenizer::new(), scorer, &query, &docs, top_n, &cancel)?
                }
                #[cfg(feature = "jieba")]
                TokenizerChoice::Jieba => search_with(
                    bm25rank::JiebaTokenizer::new(),
                    scorer,
                    &query,
                    &docs,
                    top_n,
                    &cancel,
                )?,
            };

            if json {
                let out = JsonOutput {
                    query: &query,
                    results: ranking
                        .iter()
                        .map(|(id, score)| JsonResult { id, score })
                        .collect(),
                };
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Results for {:?}:", query);
                for (rank, (id, score)) in ranking.iter().enumerate() {
                    println!("  {}. {}  score {:.4}", rank + 1, id, score);
                }
            }
        }
        Commands::Tokenize { tokenizer, text } => {
            let text = text.join(" ");
            let terms = match tokenizer {
                TokenizerChoice::Unicode => tokenize_with(UnicodeTokenizer::new(), &text)?,
                TokenizerChoice::Whitespace => tokenize_with(WhitespaceTokenizer::new(), &text)?,
                #[cfg(feature = "jieba")]
                TokenizerChoice::Jieba => tokenize_with(bm25rank::JiebaTokenizer::new(), &text)?,
            };
            for term in terms {
                println!("{term}");
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "cli")]
    {
        let args = Args::parse();
        init_tracing(args.verbose);

        if let Err(err) = run(args) {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            std::process::exit(1);
        }
    }

    #[cfg(not(feature = "cli"))]
    println!("CLI feature is disabled. Build with --features cli to enable.");

    Ok(())
}
