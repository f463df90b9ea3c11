mod config;
mod error;
mod karaoke;
mod lyric;
mod parser;
mod processor;
mod serialiser;

use crate::config::{Config, Granularity};
use crate::parser::Parser;
use crate::serialiser::AssDocument;

use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser as ClapParser};
use env_logger::Env;
use log::{info, warn};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => (),
        Err(err) => {
            eprintln!("An error occurred: {}", err);
            for cause in err.chain().skip(1) {
                eprintln!("    {}", cause);
            }
            process::exit(1);
        }
    }
}

#[derive(ClapParser)]
#[command(
    name = "lrc2ass",
    about = "Convert LRC lyrics into ASS subtitles with karaoke highlighting"
)]
struct Cli {
    #[arg(
        value_name = "INPUT",
        help = "The LRC file to read from. Use '-' to read from standard input."
    )]
    input: Option<String>,
    #[arg(
        value_name = "OUTPUT",
        help = "The ASS file to write to. Use '-' to write to standard output."
    )]
    output: Option<String>,
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Read conversion settings from a TOML file."
    )]
    config: Option<PathBuf>,
    #[arg(
        short,
        long,
        value_enum,
        help = "How each line's highlight is split into karaoke units."
    )]
    granularity: Option<Granularity>,
    #[arg(
        long,
        value_name = "SECS",
        help = "Duration of a line's last syllable when nothing follows it."
    )]
    syllable_tail: Option<f64>,
    #[arg(
        long,
        value_name = "SECS",
        help = "How long the final line stays visible after its last timestamp."
    )]
    final_hold: Option<f64>,
    #[arg(long, help = "Do not show a preview of the upcoming line.")]
    no_preview: bool,
    #[arg(
        short,
        long,
        value_name = "TEXT",
        help = "Script title. Defaults to the [ti:] tag of the input."
    )]
    title: Option<String>,
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let (input, output) = match (cli.input.as_deref(), cli.output.as_deref()) {
        (Some(input), Some(output)) => (input, output),
        _ => {
            println!("{}", Cli::command().render_usage());
            return Ok(());
        }
    };

    let config = load_config(&cli)?;

    let data = if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input)
            .context(format!("Failed to open input file: '{}'", input))?
    };

    let lyrics = Parser::new().parse(&data);
    if lyrics.lines.is_empty() {
        warn!("No timed lyrics found in '{}'", input);
    }

    let title = cli
        .title
        .clone()
        .or_else(|| lyrics.metadata.title.clone())
        .unwrap_or_else(|| config.script_info.title.clone());
    let artist = lyrics.metadata.artist.clone();
    let dialogues = processor::process(lyrics, &config);

    let doc = AssDocument {
        config: &config,
        title: &title,
        artist: artist.as_deref(),
        dialogues: &dialogues,
    };
    if output == "-" {
        serialiser::serialise_to(&doc, io::stdout().lock())?;
    } else {
        serialiser::serialise(&doc, output)?;
    }

    info!(
        "Converted {} to {} ({} events)",
        input,
        output,
        dialogues.len()
    );
    Ok(())
}

/// Built-in defaults, then the config file, then command-line flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(granularity) = cli.granularity {
        config.granularity = granularity;
    }
    if let Some(tail) = cli.syllable_tail {
        config.syllable_tail = tail;
    }
    if let Some(hold) = cli.final_hold {
        config.final_line_hold = hold;
    }
    if cli.no_preview {
        config.next_line_preview = false;
    }
    config.validate()?;

    Ok(config)
}
