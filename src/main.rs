//! Syncscan CLI
//!
//! Command-line tool for locating a syncseq in bit stream files and for
//! preparing test streams with a planted syncseq and optional noise.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::process::ExitCode;

use syncscan::gen::{self, NoiseConfig};
use syncscan::{
    locate_syncseq, BitStream, CorrParams, HumanFormatter, ImplToken, JsonFormatter,
    MultiplyMode, ReportFormatter, ShortFormatter, Syncseq,
};

/// Syncseq locator for noisy bit streams.
#[derive(Parser, Debug)]
#[command(name = "syncscan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Locate the syncseq in a stream file
    Sync(SyncArgs),
    /// Write a stream with a planted syncseq and optional noise
    Gen(GenArgs),
}

#[derive(Args, Debug)]
struct SyncArgs {
    /// Input stream file
    file: PathBuf,

    /// Syncseq word as hex digits (e.g. "a5" or "0xA5")
    #[arg(short = 's', long)]
    syncseq: String,

    /// Syncseq length in bits (1..=32)
    #[arg(short = 'b', long)]
    bit_size: u32,

    /// Limit the stream to this many bits
    #[arg(long)]
    stream_bits: Option<u64>,

    /// Aggregation strategy
    #[arg(long, value_enum, default_value = "weighted-mean")]
    strategy: ImplChoice,

    /// Bit-pattern multiplication method
    #[arg(long, value_enum, default_value = "inv-xor-prime")]
    multiply: MultiplyChoice,

    /// Noise-floor cutoff for per-position correlations
    #[arg(long, default_value_t = 0.0)]
    corr_min: f32,

    /// Minimum candidate mean
    #[arg(long, default_value_t = 0.81)]
    corr_mean_min: f32,

    /// Minimum period in bits
    #[arg(long)]
    min_period: Option<u32>,

    /// Maximum period in bits
    #[arg(long)]
    max_period: Option<u32>,

    /// Minimum repeats past the first occurrence
    #[arg(long, default_value_t = 1)]
    min_repeat: u32,

    /// Maximum repeats walked per candidate
    #[arg(long)]
    max_repeat: Option<u32>,

    /// Cap on whole periods between stream start and a candidate offset
    #[arg(long)]
    max_periods_in_offset: Option<u32>,

    /// Per-period top list size
    #[arg(long, default_value_t = 16)]
    top_per_period: usize,

    /// Byte budget for the accumulated candidate set
    #[arg(long, default_value_t = 400 * 1024 * 1024)]
    max_mean_bytes: usize,

    /// Rank on the linear (square root) scale
    #[arg(long)]
    linear: bool,

    /// Abort candidates that walk a filtered position
    #[arg(long)]
    skip_filtered: bool,

    /// Report the whole ranked list instead of the single best candidate
    #[arg(long)]
    sorted: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,
}

#[derive(Args, Debug)]
struct GenArgs {
    /// Input stream file
    file: PathBuf,

    /// Output file
    #[arg(short, long)]
    output: PathBuf,

    /// Syncseq word as hex digits (e.g. "a5" or "0xA5")
    #[arg(short = 's', long)]
    syncseq: String,

    /// Syncseq length in bits (1..=32)
    #[arg(short = 'b', long)]
    bit_size: u32,

    /// First occurrence bit offset
    #[arg(long, default_value_t = 0)]
    offset: u64,

    /// Repetition period in bits
    #[arg(short, long)]
    period: u32,

    /// Cap on occurrences past the first
    #[arg(long)]
    repeat: Option<u32>,

    /// Splice the syncseq in (growing the stream) instead of overwriting
    #[arg(long)]
    insert: bool,

    /// Noise block size in bits
    #[arg(long)]
    noise_block_size: Option<u32>,

    /// Per-block bit flip probability in percent (1..=100)
    #[arg(long, default_value_t = 100)]
    noise_prob: u32,

    /// Noise generator seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Aggregation strategy options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImplChoice {
    /// Maximum weighted sum of correlation means
    WeightedMean,
    /// Minimum sum of mean deviations
    MeanDeviat,
    /// Maximum weighted autocorrelation
    Autocorr,
}

impl From<ImplChoice> for ImplToken {
    fn from(choice: ImplChoice) -> Self {
        match choice {
            ImplChoice::WeightedMean => ImplToken::MaxWeightedSumOfCorrMean,
            ImplChoice::MeanDeviat => ImplToken::MinSumOfCorrMeanDeviat,
            ImplChoice::Autocorr => ImplToken::MaxWeightedAutocorrOfCorrValues,
        }
    }
}

/// Multiplication method options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum MultiplyChoice {
    /// Inverted-xor prime weighting
    InvXorPrime,
    /// Dispersed per-bit products
    DispersedPrime,
}

impl From<MultiplyChoice> for MultiplyMode {
    fn from(choice: MultiplyChoice) -> Self {
        match choice {
            MultiplyChoice::InvXorPrime => MultiplyMode::InvXorPrime,
            MultiplyChoice::DispersedPrime => MultiplyMode::DispersedPrime,
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
    /// Compact "offset period repeats" line
    Short,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("syncscan=debug")
            .init();
    }

    let outcome = match &cli.command {
        Command::Sync(args) => run_sync(args, cli.verbose),
        Command::Gen(args) => run_gen(args),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Parse a hex syncseq word, with or without a `0x` prefix.
fn parse_syncseq(word: &str, bit_size: u32) -> anyhow::Result<Syncseq> {
    let digits = word.trim_start_matches("0x").trim_start_matches("0X");
    if digits.is_empty() || digits.len() > 8 {
        bail!("syncseq must be 1..=8 hex digits, got \"{word}\"");
    }

    let mut padded = String::new();
    if digits.len() % 2 != 0 {
        padded.push('0');
    }
    padded.push_str(digits);

    let bytes = hex::decode(&padded).with_context(|| format!("bad hex syncseq \"{word}\""))?;
    let mut value = 0u32;
    for byte in bytes {
        value = value << 8 | u32::from(byte);
    }

    Ok(Syncseq::new(value, bit_size)?)
}

fn read_stream(path: &PathBuf, stream_bits: Option<u64>) -> anyhow::Result<BitStream> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let bit_len = stream_bits
        .unwrap_or(data.len() as u64 * 8)
        .min(data.len() as u64 * 8);
    Ok(BitStream::with_bit_len(&data, bit_len)?)
}

fn run_sync(args: &SyncArgs, verbose: bool) -> anyhow::Result<()> {
    let syncseq = parse_syncseq(&args.syncseq, args.bit_size)?;
    let stream = read_stream(&args.file, args.stream_bits)?;

    let params = CorrParams {
        impl_token: args.strategy.into(),
        multiply_mode: args.multiply.into(),
        corr_min: args.corr_min,
        corr_mean_min: args.corr_mean_min,
        min_period: args.min_period,
        max_period: args.max_period,
        min_repeat: args.min_repeat,
        max_repeat: args.max_repeat,
        max_periods_in_offset: args.max_periods_in_offset,
        max_corr_values_per_period: args.top_per_period,
        max_corr_mean_bytes: args.max_mean_bytes,
        use_linear_corr: args.linear,
        skip_on_filtered: args.skip_filtered,
        return_sorted: args.sorted,
        ..CorrParams::new()
    };

    tracing::debug!(
        stream_bits = stream.bit_len(),
        syncseq = %syncseq,
        strategy = %params.impl_token,
        "starting correlation"
    );

    let result = locate_syncseq(&stream, syncseq, &params)?;

    let report = match args.format {
        OutputFormat::Human => {
            let formatter = if verbose {
                HumanFormatter::verbose()
            } else {
                HumanFormatter::new()
            };
            formatter.format_report(&result)
        }
        OutputFormat::Json => JsonFormatter { pretty: true }.format_report(&result),
        OutputFormat::Short => ShortFormatter.format_report(&result),
    };
    print!("{report}");

    if result.stats.input_inconsistency {
        bail!("search bounds are inconsistent with the stream");
    }
    Ok(())
}

fn run_gen(args: &GenArgs) -> anyhow::Result<()> {
    let syncseq = parse_syncseq(&args.syncseq, args.bit_size)?;
    let mut stream = read_stream(&args.file, None)?;

    if args.period == 0 {
        bail!("period must be positive");
    }

    if args.insert {
        if u64::from(args.period) <= u64::from(args.bit_size) {
            bail!("insert mode needs a period longer than the syncseq");
        }
        stream = gen::insert_syncseq(&stream, syncseq, args.offset, args.period)?;
    } else {
        gen::write_syncseq(
            &mut stream,
            syncseq,
            args.offset,
            None,
            args.period,
            args.repeat,
        )?;
    }

    if let Some(block_size) = args.noise_block_size {
        if block_size == 0 || args.noise_prob == 0 || args.noise_prob > 100 {
            bail!("noise needs a positive block size and a probability in 1..=100");
        }
        let mut rng = StdRng::seed_from_u64(args.seed);
        gen::inject_block_noise(
            &mut stream,
            &NoiseConfig {
                bit_block_size: block_size,
                block_bit_prob: args.noise_prob,
            },
            &mut rng,
        );
    }

    std::fs::write(&args.output, stream.as_bytes())
        .with_context(|| format!("writing {}", args.output.display()))?;

    tracing::debug!(
        output = %args.output.display(),
        bits = stream.bit_len(),
        "stream written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_syncseq_hex_forms() {
        assert_eq!(parse_syncseq("a5", 8).unwrap().value(), 0xA5);
        assert_eq!(parse_syncseq("0xA5", 8).unwrap().value(), 0xA5);
        assert_eq!(parse_syncseq("2CD", 10).unwrap().value(), 0x2CD);
        assert_eq!(parse_syncseq("deadbeef", 32).unwrap().value(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_parse_syncseq_rejects_garbage() {
        assert!(parse_syncseq("", 8).is_err());
        assert!(parse_syncseq("zz", 8).is_err());
        assert!(parse_syncseq("123456789", 32).is_err());
        // masked to zero
        assert!(parse_syncseq("100", 8).is_err());
    }
}
