use clap::{Parser, Subcommand};
use ogcard::{config, output, process};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ogcard")]
#[command(about = "OpenGraph preview images for a statically built site")]
#[command(long_about = "\
OpenGraph preview images for a statically built site

Reads every index.html in the build output and writes a 1200x630 card next
to it:

  dist/
  ├── index.html
  ├── about/
  │   ├── index.html
  │   └── og.png              # General card: title + description
  ├── blog/my-post/
  │   ├── index.html
  │   └── og.png              # Blog card: title, date, tags
  ├── photo/dsc-1244/
  │   ├── index.html
  │   └── og.jpg              # The photo itself, letterboxed or cropped
  └── _astro/                 # Asset directory, source of photo cards

Pages whose title is just the site name are skipped.

Run 'ogcard gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Build output directory
    #[arg(long, default_value = "dist", global = true)]
    dist: PathBuf,

    /// Directory holding config.toml; logo and font paths are relative to it
    #[arg(long, default_value = ".", global = true)]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a card for every page
    Generate,
    /// Show what would be generated without rendering anything
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate => {
            let config = config::load_config(&cli.config_dir)?;
            let (tx, rx) = std::sync::mpsc::channel();
            let dist = cli.dist.clone();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_batch_event(&event, &dist);
                }
            });
            let summary = process::run(&cli.dist, &config, &cli.config_dir, Some(tx))?;
            printer.join().map_err(|_| "output thread panicked")?;
            if summary.generated == 0 && summary.failed > 0 {
                return Err("no images generated".into());
            }
        }
        Command::Check { json } => {
            let config = config::load_config(&cli.config_dir)?;
            let reports = process::inspect(&cli.dist, &config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                output::print_check_report(&reports);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
