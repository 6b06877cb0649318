use std::collections::HashMap;
use std::fmt::Display;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, LevelFilter};
use ntarc_index::aggregate::{self, BaseFeatures, CountMode, FieldPath, ValueExtractor};
use ntarc_index::{Condition, Config, Corpus, Document, EntityResolver};
use simple_logger::SimpleLogger;
use time::macros::format_description;

#[derive(Parser)]
#[command(name = "ntarc")]
#[command(about = "Query and summarize a year-partitioned corpus of paper annotations")]
#[command(version)]
struct Cli {
    #[arg(short, long, global = true, default_value = "WARN", help = "Logging level (DEBUG, INFO, WARN, ERROR)")]
    log_level: String,

    #[arg(long, global = true, env = "NTARC_API_KEY", hide_env_values = true, help = "Subscription key for the academic graph API")]
    api_key: Option<String>,

    #[arg(long, global = true, env = "NTARC_CACHE_DIR", help = "Directory holding cached entity data")]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Values of a field path, e.g. reference.authors.author
    Field {
        #[arg(help = "Path to the database directory")]
        database: PathBuf,
        #[arg(help = "The field to inspect, e.g. analysis_method.algorithms.algorithm")]
        field: String,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Base features declared in the preprocessing section
    Features {
        #[arg(help = "Path to the database directory")]
        database: PathBuf,
        #[command(flatten)]
        report: ReportArgs,
    },
    /// Citation count of each paper
    Citations {
        #[arg(help = "Path to the database directory")]
        database: PathBuf,
        #[arg(long, help = "Stop after this many papers")]
        limit: Option<usize>,
    },
    /// Number of papers per conference or journal
    Venues {
        #[arg(help = "Path to the database directory")]
        database: PathBuf,
        #[arg(short = 'F', long, default_value = " ", help = "Separator to use in the output")]
        sep: String,
        #[arg(long, help = "Stop after this many papers")]
        limit: Option<usize>,
    },
    /// Papers satisfying a condition, e.g. "preprocessing.normalization_type == 'zscore' and analysis_method.supervised_learning"
    Filter {
        #[arg(help = "Path to the database directory")]
        database: PathBuf,
        #[arg(help = "Condition over field paths, combined with and/or/not")]
        condition: String,
        #[arg(long, help = "Print the matching papers instead of their number")]
        papers: bool,
        #[arg(short = 'F', long, default_value = ";", help = "Separator to use in the output")]
        sep: String,
        #[arg(long, help = "Stop after this many papers")]
        limit: Option<usize>,
    },
}

#[derive(Args)]
struct ReportArgs {
    #[arg(long, help = "Count each value at most once per paper")]
    per_paper: bool,

    #[arg(long, help = "List the papers that use each value")]
    papers: bool,

    #[arg(short = 'F', long, default_value = ";", help = "Separator to use in the output")]
    sep: String,

    #[arg(long, help = "Stop after this many papers")]
    limit: Option<usize>,
}

fn setup_logging(log_level_str: &str) -> Result<()> {
    let log_level = match log_level_str.to_uppercase().as_str() {
        "DEBUG" => LevelFilter::Debug,
        "INFO" => LevelFilter::Info,
        "WARN" | "WARNING" => LevelFilter::Warn,
        "ERROR" => LevelFilter::Error,
        other => {
            eprintln!("Invalid log level '{}', defaulting to WARN.", other);
            LevelFilter::Warn
        }
    };

    SimpleLogger::new()
        .with_level(log_level)
        .with_timestamp_format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .init()?;

    Ok(())
}

fn open_corpus(database: PathBuf, limit: Option<usize>) -> Corpus<'static> {
    let corpus = Corpus::open(database);
    match limit {
        Some(n) => {
            info!("Stopping after {} papers", n);
            corpus.limit(n)
        }
        None => corpus,
    }
}

fn progress_bar() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} papers read")?,
    );
    Ok(pb)
}

fn output() -> BufWriter<io::StdoutLock<'static>> {
    BufWriter::new(io::stdout().lock())
}

fn resolver(cli: &Cli) -> Result<EntityResolver> {
    let mut config = Config::from_env().with_api_key(cli.api_key.clone());
    if let Some(dir) = &cli.cache_dir {
        config = config.with_cache_root(dir);
    }
    if config.api_key.is_none() {
        warn!("No API key configured; only cached entities are available");
    }
    info!("Using entity cache at {}", config.cache_root.display());
    EntityResolver::from_config(&config).context("Failed to set up the entity resolver")
}

fn report<E>(database: PathBuf, extractor: &E, args: &ReportArgs) -> Result<()>
where
    E: ValueExtractor,
    E::Value: Display,
{
    let corpus = open_corpus(database, args.limit);
    let pb = progress_bar()?;
    let documents = corpus
        .documents()
        .with_context(|| format!("Failed to scan {}", corpus.root().display()))?
        .inspect(|_| pb.inc(1));
    let mut out = output();

    if args.papers {
        let groups = aggregate::group(documents, extractor).context("Aggregation failed")?;
        pb.finish_and_clear();
        let rows = aggregate::by_set_size_desc(groups).into_iter().map(|(value, papers)| {
            let papers: Vec<String> = papers.iter().map(ToString::to_string).collect();
            (value, papers.join("|"))
        });
        aggregate::write_rows(&mut out, rows, &args.sep)?;
    } else {
        let mode = if args.per_paper { CountMode::PerPaper } else { CountMode::Occurrences };
        let counts = aggregate::count(documents, extractor, mode).context("Aggregation failed")?;
        pb.finish_and_clear();
        aggregate::write_rows(&mut out, aggregate::by_count_desc(counts), &args.sep)?;
    }
    Ok(())
}

fn citations(cli: &Cli, database: PathBuf, limit: Option<usize>) -> Result<()> {
    let resolver = resolver(cli)?;
    let corpus = open_corpus(database, limit);
    for doc in corpus.documents()? {
        let mut doc: Document = doc?;
        let key = doc.key().clone();
        let metadata = doc
            .metadata(&resolver)
            .with_context(|| format!("Failed to resolve metadata for {}", key))?;
        let count = metadata.citations(&resolver)?;
        let count = count.map_or_else(|| "?".to_string(), |c| c.to_string());
        println!("{:<6} {}", count, key);
    }
    Ok(())
}

fn venues(cli: &Cli, database: PathBuf, sep: &str, limit: Option<usize>) -> Result<()> {
    let resolver = resolver(cli)?;
    let corpus = open_corpus(database, limit);
    let pb = progress_bar()?;
    let mut venues: HashMap<String, usize> = HashMap::new();
    for doc in corpus.documents()? {
        let mut doc = doc?;
        pb.inc(1);
        let key = doc.key().clone();
        let metadata = doc
            .metadata(&resolver)
            .with_context(|| format!("Failed to resolve metadata for {}", key))?;
        match metadata.venue_name(&resolver)? {
            Some(name) => *venues.entry(name).or_insert(0) += 1,
            None => info!("No venue for {}", key),
        }
    }
    pb.finish_and_clear();

    aggregate::write_rows(&mut output(), aggregate::by_count_desc(venues), sep)?;
    Ok(())
}

fn filter(database: PathBuf, condition: &str, papers: bool, sep: &str, limit: Option<usize>) -> Result<()> {
    let condition = Condition::parse(condition).context("Failed to parse condition")?;
    let corpus = open_corpus(database, limit);
    let mut matching = Vec::new();
    for doc in corpus.documents()? {
        let doc = doc?;
        if condition
            .matches(&doc)
            .with_context(|| format!("Failed to evaluate condition on {}", doc.key()))?
        {
            matching.push(doc.key().to_string());
        }
    }
    info!("{} papers match", matching.len());

    let mut out = output();
    if papers {
        writeln!(out, "{}", matching.join(sep))?;
    } else {
        writeln!(out, "{}", matching.len())?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    setup_logging(&cli.log_level)?;

    match &cli.command {
        Command::Field { database, field, report: args } => {
            info!("Inspecting field {}", field);
            report(database.clone(), &FieldPath::new(field.as_str()), args)?
        }
        Command::Features { database, report: args } => report(database.clone(), &BaseFeatures, args)?,
        Command::Citations { database, limit } => citations(&cli, database.clone(), *limit)?,
        Command::Venues { database, sep, limit } => venues(&cli, database.clone(), sep, *limit)?,
        Command::Filter { database, condition, papers, sep, limit } => {
            filter(database.clone(), condition, *papers, sep, *limit)?
        }
    }

    info!("Finished in {:.2?}", start_time.elapsed());
    Ok(())
}
