use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "trackwatch",
    version,
    about = "Loop the audio track selected by an externally written trigger file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Watch(WatchArgs),
    Play(PlayArgs),
    Check(CheckArgs),
    Settings(SettingsArgs),
    Config(ConfigArgs),
    SystemInfo(SystemInfoArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SessionArgs {
    #[arg(long, value_name = "PATH", help = "File holding the current track number")]
    pub trigger: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "JSON map of track numbers to audio files")]
    pub tracks: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Override the session settings file")]
    pub settings: Option<PathBuf>,

    #[arg(long, help = "Do not read commands from stdin")]
    pub no_stdin: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    #[arg(long, value_name = "MS", help = "Poll interval in milliseconds")]
    pub poll_ms: Option<u64>,
}

#[derive(Args, Debug)]
pub struct PlayArgs {
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(value_name = "PATH", help = "Track map JSON to validate")]
    pub path: PathBuf,

    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    #[arg(long, value_name = "PATH", help = "Override the session settings file")]
    pub settings: Option<PathBuf>,

    #[arg(long, help = "Show saved paths")]
    pub show: bool,

    #[arg(long, help = "Forget saved paths")]
    pub clear: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[arg(long, help = "Show current config as JSON")]
    pub show: bool,

    #[arg(long, help = "Create default config file")]
    pub init: bool,

    #[arg(long, help = "Validate configuration")]
    pub validate: bool,
}

#[derive(Args, Debug)]
pub struct SystemInfoArgs {
    #[arg(long, help = "Output as JSON")]
    pub json: bool,
}
