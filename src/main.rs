use anyhow::Result;
use clap::Parser;
use optiblog::build::build_site;
use optiblog::config::Config;
use std::path::PathBuf;

/// Build the OptiScale 360 blog from a directory of post documents.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Project directory; `optiblog.yaml` is searched for here and in
    /// parent directories
    #[arg(default_value = ".")]
    directory: PathBuf,

    /// Override the output directory from the config file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_directory(&cli.directory, cli.output.as_deref())?;
    build_site(&config)?;
    Ok(())
}
