//! km3 CLI: inspect offline/online fixture stores.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};

use km3_core::source::{BranchSource, MemorySource};
use km3_offline::project::{project, Column};
use km3_offline::select::{select_best, select_by_stages, TieBreak};
use km3_offline::OfflineReader;
use km3_online::SummarySlices;

#[derive(Parser)]
#[command(name = "km3")]
#[command(about = "km3rs - typed access to neutrino-telescope detector data")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List events, branches and candidate counts of an offline store
    Inspect {
        /// Input store (JSON fixture)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Select the best reconstruction per event and project fields
    Best {
        /// Input store (JSON fixture)
        #[arg(short, long)]
        input: PathBuf,

        /// Exact stage set to require (comma-separated); defaults to
        /// most-stages-completed selection
        #[arg(long, value_delimiter = ',')]
        stages: Option<Vec<i64>>,

        /// On several exact matches in one event, keep the first stored
        /// instead of failing
        #[arg(long)]
        first_on_tie: bool,

        /// Track fields to project (comma-separated)
        #[arg(long, value_delimiter = ',', default_value = "E,lik,rec_type")]
        fields: Vec<String>,
    },

    /// Report module status and PMT rates of a summary-slice store
    Summary {
        /// Input store (JSON fixture)
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Inspect { input } => cmd_inspect(&input),
        Commands::Best { input, stages, first_on_tie, fields } => {
            cmd_best(&input, stages.as_deref(), first_on_tie, &fields)
        }
        Commands::Summary { input } => cmd_summary(&input),
    }
}

fn cmd_inspect(input: &Path) -> Result<()> {
    let reader = OfflineReader::new(MemorySource::from_json_file(input)?);
    let tracks = reader.tracks()?;
    let hits = reader.hits()?;

    let report = json!({
        "n_events": reader.n_events(),
        "n_tracks": tracks.n_tracks(),
        "n_hits": hits.n_hits(),
        "tracks_per_event": tracks.offsets.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>(),
        "branches": reader.source().branches(),
        "header": reader.header().map(|h| {
            h.keys().map(str::to_string).collect::<Vec<_>>()
        }),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_best(
    input: &Path,
    stages: Option<&[i64]>,
    first_on_tie: bool,
    fields: &[String],
) -> Result<()> {
    let reader = OfflineReader::new(MemorySource::from_json_file(input)?);
    let tracks = reader.tracks()?;

    let selection = match stages {
        Some(stages) => {
            let tie = if first_on_tie { TieBreak::FirstInStorageOrder } else { TieBreak::Error };
            select_by_stages(&tracks, stages, tie)?
        }
        None => select_best(&tracks),
    };

    let names: Vec<&str> = fields.iter().map(String::as_str).collect();
    let projected = project(&tracks, &selection, &names)?;

    let mut out = serde_json::Map::new();
    out.insert("n_events".into(), json!(selection.n_events()));
    out.insert("n_selected".into(), json!(selection.n_selected()));
    out.insert(
        "selected_candidate".into(),
        json!(selection.choices().iter().map(|c| c.map(|i| i as i64)).collect::<Vec<_>>()),
    );
    for (name, column) in &projected {
        let value = match column {
            // NaN fills serialize as null.
            Column::F64(v) => json!(v
                .iter()
                .map(|&x| if x.is_nan() { None } else { Some(x) })
                .collect::<Vec<_>>()),
            Column::I64(v) => json!(v),
        };
        out.insert(name.clone(), value);
    }
    println!("{}", serde_json::to_string_pretty(&serde_json::Value::Object(out))?);
    Ok(())
}

fn cmd_summary(input: &Path) -> Result<()> {
    let slices = SummarySlices::from_source(&MemorySource::from_json_file(input)?)?;

    let mut per_slice = Vec::with_capacity(slices.n_slices());
    for slice in 0..slices.n_slices() {
        let frames: Vec<_> = slices
            .frames_in(slice)
            .map(|frame| {
                let rates = slices.rates_hz(frame);
                json!({
                    "dom_id": slices.dom_id[frame],
                    "udp_packets": slices.udp_packets(frame),
                    "udp_max_seq": slices.udp_max_sequence_number(frame),
                    "udp_trailer": slices.has_udp_trailer(frame),
                    "hrv_channels": slices.hrv_flags(frame)
                        .iter()
                        .enumerate()
                        .filter_map(|(ch, &set)| set.then_some(ch))
                        .collect::<Vec<_>>(),
                    "mean_rate_hz": rates.iter().sum::<f64>() / rates.len() as f64,
                })
            })
            .collect();
        per_slice.push(json!({
            "frame_index": slices.frame_index[slice],
            "run": slices.run[slice],
            "frames": frames,
        }));
    }

    let report = json!({
        "n_slices": slices.n_slices(),
        "n_frames": slices.n_frames(),
        "slices": per_slice,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
