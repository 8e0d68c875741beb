use std::path::PathBuf;

use clap::Parser;
use log::{info, warn};

use text_gen_core::io::save_json;
use text_gen_core::{Model, ModelConfig};

/// Learns sentences from a text file and prints generated ones.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Text file with one sentence per line.
    /// A `.bin` snapshot is written next to it and reused on the next run.
    #[arg(short, long, default_value = "./data/quotes.txt")]
    data: PathBuf,

    /// Largest number of words grouped together.
    #[arg(short, long, default_value_t = 3)]
    words_together: usize,

    /// Number of tokens per generated sentence.
    #[arg(short, long, default_value_t = 8)]
    count: usize,

    /// Number of sentences to generate.
    #[arg(short, long, default_value_t = 10)]
    sentences: usize,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Also write the learned state as JSON to this path.
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    // Rejects a words-together of 0 before touching the file
    let mut config = ModelConfig::new(args.words_together)?;
    config.seed = args.seed;

    // Learn from the text file, or restore the snapshot if it exists
    let mut model = Model::from_file(&args.data, &config)?;
    info!("model ready with granularities {:?}", model.granularities().collect::<Vec<_>>());

    if let Some(path) = &args.export {
        save_json(path, model.export_state())?;
        info!("state exported to {}", path.display());
    }

    for i in 0..args.sentences {
        match model.generate_sentence(args.count) {
            Ok(sentence) => println!("Generated sentence {}: {}", i + 1, sentence),
            Err(e) => warn!("Generation {} failed: {}", i + 1, e),
        }
    }

    Ok(())
}
