use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use forum_server::config::{load_config, ForumConfig, HashingConfig};
use forum_server::hashing::HashingPool;
use forum_server::redirection::{RuleSource, RuleTable};

#[derive(Parser)]
#[command(name = "forum-cli")]
#[command(about = "Operator tools for the forum server", long_about = None)]
struct Cli {
    /// Server configuration file (domains, relative path, worker settings).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a password through a hash worker
    Hash {
        password: String,
        /// bcrypt cost (defaults to the configured one)
        #[arg(short, long)]
        rounds: Option<u32>,
    },
    /// Check a password against a bcrypt hash; exits 1 when they differ
    Compare { password: String, hash: String },
    /// Show where each path would be redirected by a rule file
    CheckRedirects {
        file: PathBuf,
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ForumConfig::default(),
    };

    match cli.command {
        Commands::Hash { password, rounds } => {
            let pool = single_worker_pool(&config.hashing)?;
            let hash = pool
                .hash(rounds.unwrap_or(config.hashing.bcrypt_rounds), &password)
                .await?;
            println!("{}", hash);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Compare { password, hash } => {
            let pool = single_worker_pool(&config.hashing)?;
            let matched = pool.compare(&password, &hash).await?;
            println!("{}", matched);
            Ok(if matched { ExitCode::SUCCESS } else { ExitCode::from(1) })
        }
        Commands::CheckRedirects { file, paths } => {
            let source = RuleSource {
                file: Some(file),
                ..RuleSource::new(&config.redirections, &config.domains)
            };
            let table = match RuleTable::load(&source) {
                Ok(table) => table,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Ok(ExitCode::from(2));
                }
            };

            println!("{} rule(s) loaded", table.len());
            for path in paths {
                match table.resolve(&path) {
                    Some(target) => println!("{} -> 301 {}", path, target),
                    None => println!("{} -> pass-through", path),
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn single_worker_pool(config: &HashingConfig) -> std::io::Result<HashingPool> {
    let config = HashingConfig {
        pool_size: 1,
        queue_depth: 0,
        ..config.clone()
    };
    HashingPool::from_config(&config)
}
