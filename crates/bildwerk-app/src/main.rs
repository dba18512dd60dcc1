// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk — images to PDF, image compression, and format conversion.
//
// Entry point. Initialises logging, loads the config, builds the service
// layer, and runs one workflow per invocation.

mod services;
mod state;

use std::path::PathBuf;
use std::process::ExitCode;

use bildwerk_core::types::TargetFormat;
use bildwerk_core::{PipelineConfig, StatusKind, StatusMessage};
use clap::{Parser, Subcommand};

use services::app_services::{self, AppServices};

#[derive(Parser)]
#[command(name = "bildwerk")]
#[command(about = "Turn images into a PDF, shrink them, or convert them between JPEG and PNG")]
#[command(version)]
struct Cli {
    /// Directory the output file is written to
    #[arg(long, short = 'o', default_value = ".", global = true)]
    output_dir: PathBuf,

    /// JSON config file (defaults to $XDG_CONFIG_HOME/bildwerk/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble images into one PDF, one page per image, in the given order
    Pdf {
        /// Images to include
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Leave out the image at this 0-based position (repeatable)
        #[arg(long = "drop", value_name = "INDEX")]
        drop: Vec<usize>,
        /// Output file name (".pdf" is always appended)
        #[arg(long)]
        name: Option<String>,
    },
    /// Re-encode one image as a smaller JPEG
    Compress {
        file: PathBuf,
        /// Quality between 0 and 1 (defaults to the configured quality)
        #[arg(long, short)]
        quality: Option<f32>,
        /// Output file name (".jpg" is always appended)
        #[arg(long)]
        name: Option<String>,
    },
    /// Convert one image to JPEG or PNG
    Convert {
        file: PathBuf,
        /// Target format: jpeg or png
        #[arg(long, short, default_value = "jpeg")]
        to: TargetFormat,
        /// Output file name (the target extension is always appended)
        #[arg(long)]
        name: Option<String>,
    },
    /// Print the default config as JSON
    GenConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if run(cli).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Run one command, printing each status line. Returns whether it succeeded.
async fn run(cli: Cli) -> bool {
    if let Command::GenConfig = cli.command {
        return match app_services::render_config(&PipelineConfig::default()) {
            Ok(json) => {
                println!("{json}");
                true
            }
            Err(err) => emit(&StatusMessage::from_error(&err)),
        };
    }

    let svc = match app_services::load_config(cli.config.as_deref())
        .await
        .and_then(|config| AppServices::new(config, cli.output_dir))
    {
        Ok(svc) => svc,
        Err(err) => return emit(&StatusMessage::from_error(&err)),
    };

    match cli.command {
        Command::Pdf { files, drop, name } => {
            let items = match AppServices::load_images(&files).await {
                Ok(items) => items,
                Err(err) => return emit(&StatusMessage::from_error(&err)),
            };
            if !emit(&svc.add_to_batch(items)) {
                return false;
            }

            // Highest first, so each index still refers to the original position.
            let mut drop = drop;
            drop.sort_unstable_by(|a, b| b.cmp(a));
            drop.dedup();
            for index in drop {
                if !emit(&svc.remove_from_batch(index)) {
                    return false;
                }
            }

            emit(&svc.export_document(name.as_deref()).await)
        }
        Command::Compress { file, quality, name } => {
            let item = match AppServices::load_image(&file).await {
                Ok(item) => item,
                Err(err) => return emit(&StatusMessage::from_error(&err)),
            };
            emit(&svc.select_compression_image(Some(item)));
            emit(&svc.compress_image(quality, name.as_deref()).await)
        }
        Command::Convert { file, to, name } => {
            let item = match AppServices::load_image(&file).await {
                Ok(item) => item,
                Err(err) => return emit(&StatusMessage::from_error(&err)),
            };
            svc.set_conversion_target(to);
            emit(&svc.select_conversion_image(Some(item)));
            emit(&svc.convert_image(name.as_deref()).await)
        }
        Command::GenConfig => true,
    }
}

/// Print a status line; `true` for success.
fn emit(status: &StatusMessage) -> bool {
    match status.kind {
        StatusKind::Success => {
            println!("{status}");
            true
        }
        StatusKind::Error => {
            eprintln!("error: {status}");
            false
        }
    }
}
