use clap::Parser as ClapParser;
use extddl::config::Config;
use extddl::transpiler::{self, TranspileOptions};
use std::fs;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Expand extended DDL into plain MySQL DDL
#[derive(ClapParser, Debug)]
#[command(name = "extddl", version)]
struct Cli {
    /// Input files, merged by table name
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit DROP TABLE IF EXISTS before the creates
    #[arg(long)]
    drop: bool,

    /// Append CASCADE to each DROP
    #[arg(long, requires = "drop")]
    cascade: bool,
}

fn read(path: &PathBuf) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match Config::from_json(&read(path)) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Invalid config {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let inputs: Vec<String> = cli.inputs.iter().map(read).collect();
    let options = TranspileOptions {
        drop_tables: cli.drop,
        drop_cascade: cli.cascade,
    };

    let sql = match transpiler::transpile_sources(&inputs, &config, options) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match cli.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &sql) {
                eprintln!("Failed to write {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", sql),
    }
}
