// ABOUTME: Main entry point for the deck-loader program.
// ABOUTME: Provides CLI interface to inspect, format and watch slide decks.

use clap::{Args, Parser, Subcommand};
use deck_loader::{Config, LoadedDeck};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a deck and list its resolved slides
    Inspect(InspectArgs),

    /// Re-serialize a markdown file in place
    Format(FormatArgs),

    /// Reload a deck whenever one of its source files changes
    Watch(WatchArgs),
}

#[derive(Args)]
struct DeckArgs {
    /// Path to the entry markdown file
    entry: PathBuf,

    /// Root directory for `/`-prefixed imports (defaults to DECK_USER_ROOT or the entry's directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Mode passed to preparser extension loaders
    #[arg(long)]
    mode: Option<String>,
}

#[derive(Args)]
struct InspectArgs {
    #[command(flatten)]
    deck: DeckArgs,

    /// Print the loaded deck as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FormatArgs {
    /// Path to the markdown file
    input: PathBuf,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    deck: DeckArgs,

    /// Debounce time in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,
}

fn app_config(args: &DeckArgs) -> Config {
    let mut config = Config::from_env();
    if let Some(root) = &args.root {
        config.user_root = root.clone();
    } else if std::env::var("DECK_USER_ROOT").is_err() {
        config.user_root = deck_loader::utils::watch_dir(&args.entry).to_path_buf();
    }
    if args.mode.is_some() {
        config.mode = args.mode.clone();
    }
    config
}

fn print_summary(deck: &LoadedDeck) {
    if let Some(title) = deck.headmatter.title() {
        println!("{}", title);
    }
    for slide in &deck.slides {
        let depth = slide.import_chain.as_ref().map_or(0, Vec::len);
        println!(
            "{:>3}  {:<40}  {}#{}  (depth {})",
            slide.index,
            slide.title.as_deref().unwrap_or("(untitled)"),
            slide.source.filepath,
            slide.source.index + 1,
            depth
        );
    }
    for (path, error) in deck.errors() {
        println!("error: {}:{}: {}", path, error.row + 1, error.message);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let result: deck_loader::Result<()> = match &cli.command {
        Some(Commands::Inspect(args)) => {
            let config = app_config(&args.deck);
            let reader = config.source_files();
            let entry = args.deck.entry.to_string_lossy();
            deck_loader::load(&config.user_root, &entry, &reader, config.mode.as_deref()).and_then(
                |deck| {
                    if args.json {
                        let json = serde_json::to_string_pretty(&deck)
                            .map_err(|e| anyhow::anyhow!("Failed to serialize deck: {}", e))?;
                        println!("{}", json);
                    } else {
                        print_summary(&deck);
                    }
                    Ok(())
                },
            )
        }
        Some(Commands::Format(args)) => {
            println!("Formatting {:?}...", args.input);
            let config = Config::from_env();
            let reader = config.source_files();
            deck_loader::load_document(
                &args.input.to_string_lossy(),
                &reader,
                config.mode.as_deref(),
            )
            .and_then(|md| deck_loader::save(&md))
            .map(|_| println!("Saved {:?}", args.input))
        }
        Some(Commands::Watch(args)) => {
            let config = app_config(&args.deck);
            let watch_config = config.watch_config(args.deck.entry.clone(), args.debounce_ms);
            deck_loader::watch_deck(&watch_config, &config, |deck| {
                println!("--- {} slides ---", deck.slides.len());
                print_summary(deck);
            })
        }
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
