use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the suggestion request JSON file
    #[arg(short, long)]
    pub request_file: String,

    /// Fixed seed overriding the per-call session seed (reproducible runs)
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
