#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cmd::{CommandBench, CommandNext, Executable};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod bootstrap;
mod cmd;

#[derive(Parser)]
#[command(name = "verseq")]
#[command(version = "0.0.1")]
#[command(about = "Strictly increasing sequence identifiers backed by a versioned document store.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the next identifiers of the given sequences
    Next {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Draw identifiers from concurrent tasks and check that none is handed out twice
    Bench {
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(short, long, default_value_t = 16)]
        tasks: usize,
        #[arg(long, default_value_t = 10000)]
        total: u64,
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let c: Box<dyn Executable> = match cli.command {
        Commands::Next {
            config,
            count,
            names,
        } => Box::new(CommandNext::new(config, names, count)),
        Commands::Bench {
            config,
            tasks,
            total,
            names,
        } => Box::new(CommandBench::new(config, names, tasks, total)),
    };

    if let Err(e) = cmd::run(c, tokio::signal::ctrl_c()).await {
        // the logger may not be ready if the configuration is broken
        pretty_env_logger::try_init_timed().ok();
        error!("failed to execute command: {}", e);
        return Err(e);
    }

    Ok(())
}
