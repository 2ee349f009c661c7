use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use imgcls::{cli, ClsError, Phase, TransformConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imgcls")]
#[command(about = "Image classification preprocessing and evaluation toolkit")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply the train/val/test transform pipeline to an image
    Transform {
        /// Phase: train, val or test
        #[arg(long, default_value = "val")]
        phase: String,

        /// Input image path
        #[arg(long)]
        input: PathBuf,

        /// Seed for the augmentation RNG
        #[arg(long)]
        seed: Option<u64>,

        /// Write the JSON summary to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Convert a JSON matrix of logits into class predictions
    Predict {
        /// JSON file containing [[f32; classes]; batch]
        #[arg(long)]
        logits: PathBuf,
    },

    /// Compute macro F1, minimum class F1 and a classification report
    Evaluate {
        /// JSON file with y_true, y_pred and optional target_names
        #[arg(long)]
        input: PathBuf,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // 初始化日志系统（输出到stderr，stdout留给结果）
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            let code = err.downcast_ref::<ClsError>().map_or(1, ClsError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Transform {
            phase,
            input,
            seed,
            output,
        } => {
            let phase: Phase = phase.parse()?;
            let summary =
                cli::transform_image(phase, &input, seed, &TransformConfig::default())?;
            let json = serde_json::to_string_pretty(&summary)?;
            match output {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{}", json),
            }
        }
        Command::Predict { logits } => {
            let predictions = cli::predict_file(&logits)?;
            println!("{}", serde_json::to_string(&predictions)?);
        }
        Command::Evaluate { input, json } => {
            let result = cli::evaluate_file(&input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", result.report);
                println!();
                println!("macro_f1: {:.4}", result.macro_f1);
                println!("min_f1:   {:.4}", result.min_f1);
            }
        }
    }

    Ok(())
}
