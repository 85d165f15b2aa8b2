use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use flate2::read::MultiGzDecoder;
use noodles::fasta;
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use pairgap::aligner::scoring::{GapCosts, MatchMismatch, ScoringScheme, SubstitutionMatrix};
use pairgap::aligner::{
    print_alignment, AlignmentConfig, AlignmentEngine, AlignmentMode, AlignmentResult, Band, Cigar, Coordinate,
    LaneWidth, SequencePair,
};
use pairgap::debug::DebugOutputWriter;
use pairgap::errors::PairgapError;

/// The output formats supported by pairgap
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputType {
    /// Tab separated: id, names, score, begin and end coordinates, and CIGAR
    Tsv,

    /// One JSON object per pair
    Json,

    /// Human readable alignments
    Pretty,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
/// What kind of alignment to perform
enum AlignmentSpan {
    /// Align both sequences end to end
    Global,

    /// Best matching pair of substrings
    Local,

    /// Fit sequence2 into sequence1, i.e., leading and trailing gaps in sequence1 are free
    FitInto1,

    /// Fit sequence1 into sequence2
    FitInto2,

    /// Free leading and trailing gaps on both sequences
    EndsFree,
}

impl From<AlignmentSpan> for AlignmentMode {
    fn from(value: AlignmentSpan) -> Self {
        match value {
            AlignmentSpan::Global => AlignmentMode::Global,
            AlignmentSpan::Local => AlignmentMode::Local,
            AlignmentSpan::FitInto1 => AlignmentMode::overlap_sequence1(),
            AlignmentSpan::FitInto2 => AlignmentMode::overlap_sequence2(),
            AlignmentSpan::EndsFree => AlignmentMode::overlap(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Lanes {
    #[value(name = "1")]
    One,
    #[value(name = "4")]
    Four,
    #[value(name = "8")]
    Eight,
    #[value(name = "16")]
    Sixteen,
}

impl From<Lanes> for LaneWidth {
    fn from(value: Lanes) -> Self {
        match value {
            Lanes::One => LaneWidth::One,
            Lanes::Four => LaneWidth::Four,
            Lanes::Eight => LaneWidth::Eight,
            Lanes::Sixteen => LaneWidth::Sixteen,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct PairgapCli {
    /// Set verbosity level. Use multiple times to increase the verbosity level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<PairgapSubcommand>,
}

#[derive(Subcommand, Debug)]
enum PairgapSubcommand {
    /// Align pairs of sequences from two FASTA files
    Align(AlignArgs),
}

#[derive(Args, Debug)]
struct AlignArgs {
    /// Sequences to use as sequence1 (the reference in CIGAR strings), in FASTA format, optionally gzipped.
    #[clap(help_heading = "Inputs")]
    sequences1: PathBuf,

    /// Sequences to use as sequence2 (the query in CIGAR strings).
    #[clap(help_heading = "Inputs")]
    sequences2: PathBuf,

    /// Align every record of the first file against every record of the second, instead of pairing records by
    /// their position in the file.
    #[arg(long)]
    #[clap(help_heading = "Inputs")]
    all_pairs: bool,

    #[arg(short = 'j', long, default_value = "1")]
    #[clap(help_heading = "Processing")]
    num_threads: Option<usize>,

    /// Number of pairs aligned in lockstep by each thread
    #[arg(value_enum, short = 'l', long, default_value = "1")]
    #[clap(help_heading = "Processing")]
    lanes: Lanes,

    /// Output filename. If not given, defaults to stdout
    #[arg(short, long)]
    #[clap(help_heading = "Outputs")]
    output: Option<PathBuf>,

    /// Output file type.
    #[arg(value_enum, short = 'O', long, default_value = "tsv")]
    #[clap(help_heading = "Outputs")]
    output_type: OutputType,

    /// Use extended CIGAR operations (=/X instead of M)
    #[arg(long)]
    #[clap(help_heading = "Outputs")]
    extended_cigar: bool,

    /// Write score and trace matrices of each pair to this directory
    #[arg(long)]
    #[clap(help_heading = "Outputs")]
    debug_output: Option<PathBuf>,

    /// Alignment span
    #[arg(value_enum, short = 'm', long, default_value = "global")]
    #[clap(help_heading = "Alignment configuration")]
    alignment_span: AlignmentSpan,

    /// Score sequences as proteins with BLOSUM62 instead of match/mismatch scores
    #[arg(long)]
    #[clap(help_heading = "Alignment configuration")]
    protein: bool,

    /// Bonus for matching symbols
    #[arg(short = 'a', default_value = "1")]
    #[clap(help_heading = "Alignment configuration")]
    score_match: Option<u16>,

    /// Penalty for mismatching symbols
    #[arg(short = 'n', default_value = "4")]
    #[clap(help_heading = "Alignment configuration")]
    cost_mismatch: Option<u16>,

    /// Penalty for opening a new gap
    #[arg(short = 'g', default_value = "6")]
    #[clap(help_heading = "Alignment configuration")]
    cost_gap_open: Option<u16>,

    /// Penalty for each gap position
    #[arg(short = 'e', default_value = "2")]
    #[clap(help_heading = "Alignment configuration")]
    cost_gap_extend: Option<u16>,

    /// Lowest diagonal (column minus row) to compute. Requires --band-upper.
    #[arg(long, allow_hyphen_values = true, requires = "band_upper")]
    #[clap(help_heading = "Alignment configuration")]
    band_lower: Option<isize>,

    /// Highest diagonal to compute. Requires --band-lower.
    #[arg(long, allow_hyphen_values = true, requires = "band_lower")]
    #[clap(help_heading = "Alignment configuration")]
    band_upper: Option<isize>,
}

struct SequenceRecord(String, Vec<u8>);

/// A batch of pairs to align, as indices into both record lists
struct Job(Vec<(usize, usize, usize)>);

struct OutputRecord(usize, String);

#[derive(Serialize)]
struct JsonRecord<'s> {
    name1: &'s str,
    name2: &'s str,
    #[serde(flatten)]
    result: &'s AlignmentResult<'s, i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cigar: Option<String>,
}

fn build_subscriber(verbose: u8) -> Result<()> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))?;

    let stderr_log = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_file(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_filter(filter_layer);

    Registry::default().with(stderr_log).try_init()?;

    Ok(())
}

fn read_fasta(path: &Path) -> Result<Vec<SequenceRecord>> {
    let is_gzipped = path.extension().is_some_and(|ext| ext == "gz");

    let reader_inner: Box<dyn BufRead + Send> = if is_gzipped {
        Box::new(
            File::open(path)
                .map(MultiGzDecoder::new)
                .map(BufReader::new)?,
        )
    } else {
        Box::new(File::open(path).map(BufReader::new)?)
    };

    let mut reader = fasta::io::Reader::new(reader_inner);
    let mut records = Vec::new();

    for record in reader.records() {
        match record {
            Ok(r) => {
                let seq_name = String::from_utf8_lossy(r.name()).to_string();
                records.push(SequenceRecord(seq_name, r.sequence().as_ref().to_vec()));
            },
            Err(err) => {
                warn!("Could not parse record in {:?}: {err}", path);
            }
        }
    }

    Ok(records)
}

fn format_result(
    result: &AlignmentResult<'_, i32>,
    name1: &str,
    name2: &str,
    output_type: OutputType,
    extended_cigar: bool,
) -> Result<String> {
    let cigar = result.alignment.as_ref()
        .map(|alignment| Cigar::from_alignment(alignment, extended_cigar).to_string());

    let output = match output_type {
        OutputType::Tsv => {
            let coordinate = |c: Option<Coordinate>| c.map_or(".\t.".to_string(), |c| format!("{}\t{}", c.sequence1, c.sequence2));

            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                result.id,
                name1,
                name2,
                result.score.map_or(".".to_string(), |s| s.to_string()),
                coordinate(result.begin),
                coordinate(result.end),
                cigar.as_deref().unwrap_or("*"),
            )
        },
        OutputType::Json => serde_json::to_string(&JsonRecord { name1, name2, result, cigar })?,
        OutputType::Pretty => {
            let alignment = result.alignment.as_ref()
                .map(print_alignment)
                .unwrap_or_default();

            format!(
                "# {} {} vs {}: score {}\n{}\n",
                result.id,
                name1,
                name2,
                result.score.map_or(".".to_string(), |s| s.to_string()),
                alignment,
            )
        },
    };

    Ok(output)
}

fn align_subcommand(args: &AlignArgs) -> Result<()> {
    let gaps = GapCosts::new(
        -(args.cost_gap_open.unwrap_or(6) as i32),
        -(args.cost_gap_extend.unwrap_or(2) as i32),
    );

    if args.protein {
        let config = build_config(args, SubstitutionMatrix::blosum62(), gaps);
        run_alignments(args, config)
    } else {
        let scoring = MatchMismatch::new(
            args.score_match.unwrap_or(1) as i32,
            -(args.cost_mismatch.unwrap_or(4) as i32),
        );
        let config = build_config(args, scoring, gaps);
        run_alignments(args, config)
    }
}

fn build_config<C: ScoringScheme>(args: &AlignArgs, scoring: C, gaps: GapCosts) -> AlignmentConfig<C> {
    let mut config = AlignmentConfig::new(scoring, gaps)
        .with_mode(args.alignment_span.into())
        .with_lane_width(args.lanes.into());

    if let (Some(lower), Some(upper)) = (args.band_lower, args.band_upper) {
        config = config.with_band(Band::new(lower, upper));
    }

    config
}

fn run_alignments<C>(args: &AlignArgs, config: AlignmentConfig<C>) -> Result<()>
where
    C: ScoringScheme + Clone + Send + Sync,
{
    config.validate()
        .with_context(|| "Invalid alignment configuration.")?;

    let records1 = read_fasta(&args.sequences1)
        .with_context(|| format!("Could not read sequences from {:?}", args.sequences1))?;
    let records2 = read_fasta(&args.sequences2)
        .with_context(|| format!("Could not read sequences from {:?}", args.sequences2))?;

    let pairs: Vec<(usize, usize)> = if args.all_pairs {
        (0..records1.len())
            .flat_map(|i| (0..records2.len()).map(move |j| (i, j)))
            .collect()
    } else {
        if records1.len() != records2.len() {
            warn!("Input files have a different number of records ({} and {}), extra records are ignored.",
                records1.len(), records2.len());
        }

        (0..records1.len().min(records2.len())).map(|i| (i, i)).collect()
    };

    info!("Aligning {} pair(s) with {} thread(s).", pairs.len(), args.num_threads.unwrap_or(1));

    let debug_writer = args.debug_output.as_ref().map(DebugOutputWriter::new);

    let (tx, rx) = crossbeam_channel::unbounded();
    let (tx_out, rx_out) = crossbeam_channel::unbounded();

    thread::scope(|scope| -> Result<()> {
        let records1 = &records1;
        let records2 = &records2;
        let debug_writer = debug_writer.as_ref();

        // Spawn thread that hands out batches of pairs
        let batch_size = config.lane_width.width() * 16;
        let pairs = &pairs;
        scope.spawn(move || -> Result<()> {
            for (batch_ix, batch) in pairs.chunks(batch_size).enumerate() {
                let first_id = batch_ix * batch_size;
                let job = batch.iter().enumerate()
                    .map(|(k, (i, j))| (first_id + k, *i, *j))
                    .collect();

                tx.send(Job(job))?;
            }

            Ok(())
        });

        // Spawn thread that writes the output, in input order
        let writer_thread = scope.spawn(move || -> Result<()> {
            let mut writer: Box<dyn Write> = match &args.output {
                Some(output) => Box::new(BufWriter::new(File::create(output)?)),
                None => Box::new(BufWriter::new(io::stdout().lock())),
            };

            let mut pending = BTreeMap::new();
            let mut next_id = 0;

            while let Ok(OutputRecord(id, line)) = rx_out.recv() {
                pending.insert(id, line);

                while let Some(line) = pending.remove(&next_id) {
                    writeln!(writer, "{}", line)?;
                    next_id += 1;
                }
            }

            writer.flush()?;

            Ok(())
        });

        // Spawn aligner threads
        let mut aligner_threads = Vec::new();
        for _ in 0..args.num_threads.unwrap_or(1).max(1) {
            let thread_rx = rx.clone();
            let tx_out_thread = tx_out.clone();
            let config = config.clone();

            aligner_threads.push(scope.spawn(move || -> Result<()> {
                let mut engine = match debug_writer {
                    Some(debug_writer) => AlignmentEngine::<C, i32>::new_with_debug_output(config, debug_writer)?,
                    None => AlignmentEngine::<C, i32>::new(config)?,
                };

                while let Ok(Job(job)) = thread_rx.recv() {
                    debug!("Received batch of {} pair(s).", job.len());

                    let pairs = job.iter()
                        .map(|&(id, i, j)| SequencePair::new(id, &records1[i].1, &records2[j].1));

                    let mut formatted = Vec::with_capacity(job.len());
                    engine.compute(pairs, |result| {
                        let (_, i, j) = job[result.id - job[0].0];
                        formatted.push(
                            format_result(&result, &records1[i].0, &records2[j].0, args.output_type, args.extended_cigar)
                                .map(|line| OutputRecord(result.id, line))
                        );
                    }).with_context(|| format!("Could not align batch starting at pair {}", job[0].0))?;

                    for record in formatted {
                        tx_out_thread.send(record?)?;
                    }
                }

                Ok(())
            }));
        }

        drop(tx_out);

        for aligner_thread in aligner_threads {
            aligner_thread.join()
                .map_err(|_| PairgapError::IOError(io::Error::other("aligner thread panicked")))??;
        }

        writer_thread.join()
            .map_err(|_| PairgapError::IOError(io::Error::other("output thread panicked")))??;

        Ok(())
    })?;

    if let Some(debug_writer) = debug_writer {
        debug_writer.join()?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = PairgapCli::parse();
    build_subscriber(args.verbose)?;

    match &args.command {
        Some(PairgapSubcommand::Align(v)) => align_subcommand(v)?,
        None => anyhow::bail!("No subcommand given."),
    };

    Ok(())
}
