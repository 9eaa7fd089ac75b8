use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tools::{
    Summary, ToolError, format_source, from_json, load, parse_layers, read_file, render_preview,
    to_json, walk,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Check, format and preview scrollytelling story files")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse and validate a story, then print a summary
    Check {
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-serialize a story in canonical form
    Fmt {
        file: PathBuf,

        /// Overwrite the file in place
        #[arg(long, conflicts_with = "check")]
        write: bool,

        /// Fail if the file is not already canonical
        #[arg(long)]
        check: bool,
    },

    /// Print the static HTML the story builds
    Render {
        file: PathBuf,

        /// Build as a narrow (mobile) viewport would
        #[arg(long)]
        narrow: bool,
    },

    /// Print a story as JSON
    ToJson { file: PathBuf },

    /// Turn a JSON story into a config file
    FromJson { file: PathBuf },

    /// Scroll through the story against a simulated map and print each call
    Walk {
        file: PathBuf,

        /// Style layer as <id>=<type>, e.g. water=fill (repeatable)
        #[arg(long = "layer")]
        layers: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Args::parse().command) {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), ToolError> {
    match command {
        Command::Check { file, json } => {
            let (binding, config) = load(&read_file(&file)?)?;
            let summary = Summary::of(binding, &config);
            if json {
                let text = serde_json::to_string_pretty(&summary).map_err(ToolError::Json)?;
                println!("{text}");
            } else {
                print!("{summary}");
            }
        }
        Command::Fmt { file, write, check } => {
            let src = read_file(&file)?;
            let formatted = format_source(&src)?;
            if check {
                if formatted != src {
                    return Err(ToolError::NotFormatted(file.display().to_string()));
                }
            } else if write {
                if formatted != src {
                    fs::write(&file, formatted).map_err(ToolError::Io)?;
                    info!(file = %file.display(), "reformatted");
                }
            } else {
                print!("{formatted}");
            }
        }
        Command::Render { file, narrow } => {
            let (_, config) = load(&read_file(&file)?)?;
            print!("{}", render_preview(config, narrow)?);
        }
        Command::ToJson { file } => {
            let (_, config) = load(&read_file(&file)?)?;
            println!("{}", to_json(&config)?);
        }
        Command::FromJson { file } => {
            print!("{}", from_json(&read_file(&file)?)?);
        }
        Command::Walk { file, layers } => {
            let layers = parse_layers(&layers)?;
            let (_, config) = load(&read_file(&file)?)?;
            for line in walk(config, &layers)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}
