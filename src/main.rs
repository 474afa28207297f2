use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = trackwatch::cli::Cli::parse();
    trackwatch::run(cli)
}
