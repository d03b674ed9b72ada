// CLI application - panics are acceptable for fatal errors
#![allow(clippy::unwrap_used)]

use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ingredient_crf::{ParserOptions, SentenceParser, VolumetricUnits};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// Path to the trained CRF model (gzipped JSON). Falls back to the
    /// INGREDIENT_CRF_MODEL environment variable.
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Path to the embeddings file (gzipped word2vec text)
    #[arg(long, global = true)]
    embeddings: Option<PathBuf>,

    /// Path to the foundation-food catalog (gzipped CSV)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a single ingredient sentence
    Parse {
        sentence: String,
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
        /// Resolve the name against the foundation-food catalog
        #[arg(short, long)]
        foundation_foods: bool,
        /// Keep units as free strings
        #[arg(long)]
        string_units: bool,
        /// Use imperial definitions for cup, pint, quart, gallon, fl oz
        #[arg(long)]
        imperial: bool,
        /// Join alternative names into one instead of separating them
        #[arg(long)]
        joined_names: bool,
    },
    /// Parse a file of ingredient sentences, one per line
    ParseFile {
        path: PathBuf,
        /// Resolve names against the foundation-food catalog
        #[arg(short, long)]
        foundation_foods: bool,
    },
    /// Show tokens, labels and marginals for a sentence
    Inspect {
        sentence: String,
    },
}

fn load_parser(cli: &Cli) -> Result<SentenceParser> {
    let model = cli
        .model
        .clone()
        .or_else(|| std::env::var(ingredient_crf::MODEL_ENV).ok().map(PathBuf::from))
        .context("no model path given; pass --model or set INGREDIENT_CRF_MODEL")?;
    let embeddings = cli
        .embeddings
        .clone()
        .or_else(|| std::env::var(ingredient_crf::EMBEDDINGS_ENV).ok().map(PathBuf::from));
    let catalog = cli
        .catalog
        .clone()
        .or_else(|| std::env::var(ingredient_crf::CATALOG_ENV).ok().map(PathBuf::from));

    SentenceParser::from_paths(&model, embeddings.as_deref(), catalog.as_deref())
        .context("failed to load parser resources")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let parser = load_parser(&cli)?;

    match &cli.command {
        Commands::Parse {
            sentence,
            json,
            foundation_foods,
            string_units,
            imperial,
            joined_names,
        } => {
            let options = ParserOptions::default()
                .with_foundation_foods(*foundation_foods)
                .with_string_units(*string_units)
                .with_separate_names(!*joined_names)
                .with_volumetric_units(if *imperial {
                    VolumetricUnits::Imperial
                } else {
                    VolumetricUnits::UsCustomary
                });

            let parsed = parser.parse(sentence, &options)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&parsed)?);
            } else {
                println!("{parsed:#?}");
            }
        }
        Commands::ParseFile {
            path,
            foundation_foods,
        } => {
            let options = ParserOptions::default().with_foundation_foods(*foundation_foods);
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            let mut results = Vec::new();
            for line in BufReader::new(file).lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                results.push(parser.parse(&line, &options)?);
            }
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Inspect { sentence } => {
            let info = parser.inspect(sentence, &ParserOptions::default())?;
            println!("input:      {}", info.sentence);
            println!("normalized: {}", info.normalized);
            println!("labels:     {}", info.label_set.join(" "));
            for (i, token) in info.tokens.iter().enumerate() {
                println!(
                    "{:>3}  {:<20} {:<6} {:<12} {:.4}",
                    i,
                    token.text,
                    token.pos_tag,
                    info.labels[i].as_str(),
                    info.scores[i],
                );
            }
        }
    }

    Ok(())
}
