//! FrameLab - command-line frame editor
//!
//! Loads an image, applies a chain of effects, records every step in a
//! snapshot history and writes the result. Undo steps can be replayed from
//! the history before writing.

mod io;
mod ops;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use framelab_core::AdjustmentParams;
use framelab_effects::{EffectsRegistry, ParamValue, Unstoppable};
use framelab_history::{HistoryConfig, HistoryEvent, HistoryStore};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::ops::OpSpec;

#[derive(Debug, Parser)]
#[command(name = "framelab", version, about = "Apply pixel effects to an image with undo history")]
struct Args {
    /// Input image.
    input: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Operation to apply, in order. `name` or `name:key=value,...`,
    /// e.g. `adjust:brightness=20`, `blur:radius=3`, `resize:max_width=640,max_height=480`.
    #[arg(long = "op", value_name = "OP")]
    ops: Vec<OpSpec>,

    /// Undo this many steps after applying the operations.
    #[arg(long, default_value_t = 0)]
    undo: usize,

    /// History configuration (JSON).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the history log after processing.
    #[arg(long)]
    history: bool,

    /// Print history entry metadata as JSON after processing.
    #[arg(long)]
    history_json: bool,

    /// List the available operations and their parameters.
    #[arg(long)]
    list_ops: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let registry = EffectsRegistry::new();

    if args.list_ops {
        print_operations(&registry);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => HistoryConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => HistoryConfig::default(),
    };
    let history = HistoryStore::with_config(config)?;
    history.set_observer(|event: &HistoryEvent| {
        debug!(
            kind = ?event.kind,
            current = ?event.current_index,
            len = event.len,
            "History changed"
        );
    });

    let mut frame = io::load_frame(&args.input)?;
    info!(
        path = %args.input.display(),
        width = frame.width(),
        height = frame.height(),
        bytes = frame.memory_size(),
        "Loaded image"
    );
    let name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    history
        .add_state(frame.clone(), format!("Open {name}"), AdjustmentParams::default())
        .wait()?;

    for op in &args.ops {
        let Some(effect) = registry.find(&op.name) else {
            bail!("unknown operation '{}' (see --list-ops)", op.name);
        };
        frame = effect
            .apply(&frame, &op.params, &Unstoppable)
            .with_context(|| format!("{} failed", op.describe()))?;
        info!(op = %op.describe(), width = frame.width(), height = frame.height(), "Applied");

        // Each snapshot is awaited so the log keeps the command-line order.
        history
            .add_state(frame.clone(), op.describe(), adjustment_snapshot(op))
            .wait()?;
    }

    for step in 0..args.undo {
        match history.undo() {
            Some(entry) => {
                info!(index = entry.index, description = %entry.description, "Undone");
                frame = entry.buffer;
            }
            None => {
                warn!(requested = args.undo, performed = step, "History start reached");
                break;
            }
        }
    }

    if args.history {
        for line in history.descriptions() {
            println!("{line}");
        }
    }
    if args.history_json {
        println!("{}", serde_json::to_string_pretty(&history.summaries())?);
    }

    if let Some(output) = &args.output {
        io::save_frame(&frame, output)?;
        info!(
            path = %output.display(),
            entries = history.len(),
            compressed_bytes = history.compressed_size(),
            "Wrote image"
        );
    }
    Ok(())
}

/// Slider values to store with a history entry.
fn adjustment_snapshot(op: &OpSpec) -> AdjustmentParams {
    let get = |key: &str| op.params.get(key).copied();
    let float = |key: &str| get(key).map(ParamValue::as_f32).unwrap_or(0.0);
    AdjustmentParams::new(
        float("brightness"),
        float("contrast"),
        float("saturation"),
        get("radius").map(ParamValue::as_i32).unwrap_or(0),
    )
}

fn print_operations(registry: &EffectsRegistry) {
    println!("Available operations:");
    for effect in registry.effects() {
        let params: Vec<String> = effect
            .params()
            .iter()
            .map(|p| format!("{}={}", p.name, format_value(p.default)))
            .collect();
        if params.is_empty() {
            println!("  {}", effect.name().to_lowercase());
        } else {
            println!("  {}:{}", effect.name().to_lowercase(), params.join(","));
        }
    }
}

fn format_value(value: ParamValue) -> String {
    match value {
        ParamValue::Float(f) => format!("{f}"),
        ParamValue::Int(i) => format!("{i}"),
    }
}
