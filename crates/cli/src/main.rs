//! `git bzr` — bidirectional Git ↔ Bazaar synchronization bridge.
//!
//! Subcommands: `add` registers a Bazaar branch under a symbolic name,
//! `fetch` imports new Bazaar history into the local mirror branch, and
//! `push` exports new local commits back to the Bazaar branch.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gitbzrsync_core::bzr::Bzr;
use gitbzrsync_core::fetch::{Fetch, FetchOutcome};
use gitbzrsync_core::git::GitRepo;
use gitbzrsync_core::marks::{MarkState, MarkStore};
use gitbzrsync_core::push::Push;
use gitbzrsync_core::registry::RemoteRegistry;

/// Bridge between a Git repository and Bazaar branches.
#[derive(Parser, Debug)]
#[command(
    name = "git-bzr",
    version,
    about = "Bidirectional Git ↔ Bazaar synchronization bridge"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a Bazaar branch as a named remote.
    Add {
        /// Symbolic remote name.
        name: String,
        /// Path to the Bazaar branch root.
        location: String,
    },

    /// Import new Bazaar history into the local mirror branch.
    Fetch {
        /// Registered remote name.
        name: String,
    },

    /// Export new local commits back to the Bazaar branch.
    Push {
        /// Registered remote name.
        name: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Minimal logging for an interactive CLI.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Every subcommand works relative to the enclosing repository.
    let cwd = std::env::current_dir()?;
    let repo = GitRepo::discover(&cwd)?;
    let registry = RemoteRegistry::new(&repo);

    match cli.command {
        Commands::Add { name, location } => {
            registry.register(&name, &location)?;
            println!("Bazaar branch {name} added. You can fetch it with `git bzr fetch {name}`");
            Ok(())
        }

        Commands::Fetch { name } => {
            let remote = registry.resolve(&name)?;
            let marks = MarkStore::new(repo.git_dir(), &name);
            match marks.state() {
                MarkState::New => {
                    println!("There doesn't seem to be an existing refmap. Doing an initial import");
                }
                MarkState::Synced => println!("Updating remote {name}"),
                MarkState::Corrupt => {}
            }

            let bzr = Bzr::new(&remote.location);
            let fetch = Fetch {
                repo: &repo,
                marks: &marks,
                exporter: &bzr,
                importer: &repo,
            };
            match fetch.run(&remote).await? {
                FetchOutcome::InitialImport { .. } => {}
                FetchOutcome::Updated { commits, .. } => {
                    println!("Changes since last update:");
                    for commit in &commits {
                        println!("  {}: {}", commit.author, commit.summary);
                    }
                }
            }
            Ok(())
        }

        Commands::Push { name } => {
            let remote = registry.resolve(&name)?;
            let marks = MarkStore::new(repo.git_dir(), &name);
            let bzr = Bzr::new(&remote.location);
            let push = Push {
                repo: &repo,
                marks: &marks,
                exporter: &repo,
                importer: &bzr,
            };
            let outcome = push.run(&remote).await?;
            if !outcome.tool_stdout.is_empty() {
                print!("{}", outcome.tool_stdout);
            }
            Ok(())
        }
    }
}
