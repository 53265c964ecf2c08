use std::path::PathBuf;
use std::time::Duration;

use brutus_cli::{
    DEFAULT_POLL_INTERVAL_MS, Error, Plan, Scheme, last_index_within, load_word_list, run,
    summarize,
};
use brutus_core::{CandidateSource, DEFAULT_MAX_CANDIDATE_LEN, HashOracle, candidate_index};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "brutus")]
#[command(about = "Recover a password from a salted digest by enumeration or word list")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search for the candidate whose digest matches the target
    Search(SearchArgs),
    /// Print the digest of a candidate, e.g. to produce a test target
    Digest(DigestArgs),
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Target digest (crypt string, or hex for sha1)
    #[arg(short, long)]
    target: String,

    /// Salt passed to the digest function
    #[arg(short, long)]
    salt: String,

    /// Digest function
    #[arg(long, value_enum, default_value_t = Scheme::Crypt)]
    scheme: Scheme,

    /// Generate candidates over these characters
    #[arg(short, long)]
    charset: Option<String>,

    /// Read candidates from this file, one per line
    #[arg(short, long)]
    wordlist: Option<PathBuf>,

    /// First index to test
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Start from this candidate's index (charset mode, cannot be combined with --start)
    #[arg(long, conflicts_with = "start")]
    resume_from: Option<String>,

    /// Last index to test (default: last word, or last candidate of --max-len characters)
    #[arg(long)]
    stop: Option<u64>,

    /// Longest generated candidate
    #[arg(long, default_value_t = DEFAULT_MAX_CANDIDATE_LEN)]
    max_len: usize,

    /// Number of parallel search tasks (default: available parallelism)
    #[arg(short = 'j', long)]
    workers: Option<usize>,

    /// How often to poll the tasks, in milliseconds
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    /// Give up after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Disable progress spinner
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct DigestArgs {
    /// Candidate to hash
    candidate: String,

    /// Salt passed to the digest function
    #[arg(short, long)]
    salt: String,

    /// Digest function
    #[arg(long, value_enum, default_value_t = Scheme::Crypt)]
    scheme: Scheme,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brutus_core=info,brutus_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match Cli::parse().command {
        Command::Search(args) => search(args).await,
        Command::Digest(args) => {
            let digest = args
                .scheme
                .oracle()
                .digest(&args.candidate, args.salt.as_bytes())
                .map_err(brutus_core::Error::from)?;
            println!("{}", args.scheme.format_digest(&digest));
            Ok(())
        }
    }
}

async fn search(args: SearchArgs) -> Result<(), Error> {
    let (source, default_stop) = match (&args.charset, &args.wordlist) {
        (Some(charset), None) => {
            let charset: Vec<char> = charset.chars().collect();
            let stop = last_index_within(charset.len(), args.max_len);
            (CandidateSource::Charset(charset), stop)
        }
        (None, Some(path)) => {
            let words = load_word_list(path).await?;
            let stop = (words.len() as u64).saturating_sub(1);
            (CandidateSource::WordList(words), stop)
        }
        _ => {
            return Err(Error::InvalidArgs {
                reason: "exactly one of --charset and --wordlist is required",
            });
        }
    };

    let start = match (&args.resume_from, &source) {
        (Some(candidate), CandidateSource::Charset(charset)) => candidate_index(candidate, charset)
            .ok_or_else(|| Error::NotInCharset { candidate: candidate.clone() })?,
        (Some(_), CandidateSource::WordList(_)) => {
            return Err(Error::InvalidArgs { reason: "--resume-from requires --charset" });
        }
        (None, _) => args.start,
    };

    let workers = args
        .workers
        .or_else(|| std::thread::available_parallelism().ok().map(|n| n.get()))
        .unwrap_or(1);

    let plan = Plan {
        start,
        stop: args.stop.unwrap_or(default_stop),
        source,
        target: args.scheme.parse_target(&args.target)?,
        salt: args.salt.into_bytes(),
        scheme: args.scheme,
        max_candidate_len: args.max_len,
        workers,
    };

    println!(
        "Searching indices {}..={} using {} workers ({:?})",
        plan.start, plan.stop, plan.workers, plan.scheme
    );

    // Set up progress spinner
    let progress_bar = if !args.no_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress bar template"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let tasks = run(
        plan,
        Duration::from_millis(args.poll_interval_ms.max(1)),
        args.timeout_secs.map(Duration::from_secs),
        progress_bar.as_ref(),
    )
    .await?;

    if let Some(pb) = progress_bar {
        pb.finish_with_message("done");
    }

    let report = summarize(&tasks)?;
    match &report.password {
        Some(password) => println!("Found: {password}"),
        None if report.timed_out => println!("Timed out without a match."),
        None => println!("Not found."),
    }

    let rate = if report.elapsed_seconds > 0.0 {
        report.hashes_attempted as f64 / report.elapsed_seconds
    } else {
        0.0
    };
    println!(
        "{} hashes in {:.3}s ({:.0} hashes/s)",
        report.hashes_attempted, report.elapsed_seconds, rate
    );

    Ok(())
}
