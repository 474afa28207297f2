pub mod audio;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod settings;
pub mod system;
pub mod tracks;
pub mod watch;

use anyhow::Context;
use audio::renderer::CommandOutput;
use cli::{Cli, Commands, SessionArgs};
use controller::Controller;
use events::{ConsoleSink, ControlEvent, Intent};
use settings::SettingsStore;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;
use tracks::TrackMap;
use watch::DiskTrigger;

pub type ConsoleController = Controller<CommandOutput, DiskTrigger, ConsoleSink>;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Watch(args) => watch(args),
        Commands::Play(args) => play(args),
        Commands::Check(args) => check(args),
        Commands::Settings(args) => settings_cmd(args),
        Commands::Config(args) => config_cmd(args),
        Commands::SystemInfo(args) => system_info(args),
    }
}

const COMMANDS_HELP: &str =
    "commands: start, stop, play, trigger <path>, tracks <path>, status, quit";

fn setup_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn watch(args: cli::WatchArgs) -> anyhow::Result<()> {
    let mut config = config::Config::load().context("load config")?;
    if let Some(poll_ms) = args.poll_ms {
        config.poll_interval_ms = poll_ms;
    }
    config.validate().context("invalid config")?;

    let mut controller = build_controller(&config, &args.session)?;
    controller
        .start()
        .map_err(|err| anyhow::anyhow!("cannot start watching: {err}"))?;

    if !args.session.no_stdin {
        spawn_input_reader(controller.sender());
    }
    controller.run()
}

fn play(args: cli::PlayArgs) -> anyhow::Result<()> {
    let config = config::Config::load().context("load config")?;
    config.validate().context("invalid config")?;

    let mut controller = build_controller(&config, &args.session)?;
    controller.play_once();
    if !controller.is_active() {
        anyhow::bail!("nothing is playing");
    }

    if !args.session.no_stdin {
        spawn_input_reader(controller.sender());
    }
    controller.run()
}

fn build_controller(
    config: &config::Config,
    args: &SessionArgs,
) -> anyhow::Result<ConsoleController> {
    let settings_path = match args.settings.clone().or_else(|| config.settings_path.clone()) {
        Some(path) => path,
        None => SettingsStore::default_path()?,
    };
    let output = CommandOutput::new(config.player.clone(), config.volume);
    let mut controller = Controller::new(config, output, DiskTrigger, ConsoleSink)
        .with_settings(SettingsStore::new(settings_path));

    if let Err(err) = controller.restore_settings() {
        tracing::warn!(error = ?err, "ignoring previous settings");
    }
    if let Some(trigger) = args.trigger.clone() {
        controller.select_trigger(trigger);
    }
    if let Some(tracks) = args.tracks.clone() {
        controller.select_tracks(tracks);
    }
    Ok(controller)
}

/// Forwards stdin commands to the control loop until EOF.
fn spawn_input_reader(tx: Sender<ControlEvent>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if line.trim().is_empty() {
                continue;
            }
            match Intent::parse(&line) {
                Ok(intent) => {
                    let quit = intent == Intent::Quit;
                    if tx.send(ControlEvent::Intent(intent)).is_err() || quit {
                        return;
                    }
                }
                Err(err) => eprintln!("{err} ({COMMANDS_HELP})"),
            }
        }
        let _ = tx.send(ControlEvent::InputClosed);
    });
}

fn check(args: cli::CheckArgs) -> anyhow::Result<()> {
    let tracks = TrackMap::load(&args.path)?;

    if args.json {
        let bindings: std::collections::BTreeMap<String, PathBuf> = tracks
            .iter()
            .map(|(track, path)| (track.to_string(), path.to_path_buf()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&bindings)?);
        return Ok(());
    }

    for (track, path) in tracks.iter() {
        println!("Song number {track} bound to {}", path.display());
    }
    println!("Track map OK ({} song(s))", tracks.len());
    Ok(())
}

fn settings_cmd(args: cli::SettingsArgs) -> anyhow::Result<()> {
    let path = match args.settings {
        Some(path) => path,
        None => match config::Config::load()?.settings_path {
            Some(path) => path,
            None => SettingsStore::default_path()?,
        },
    };
    let store = SettingsStore::new(path);

    if args.clear {
        if store.clear()? {
            println!("Cleared {}", store.path().display());
        } else {
            println!("Nothing saved at {}", store.path().display());
        }
        return Ok(());
    }

    if args.show {
        match store.load()? {
            Some(saved) => {
                println!("Trigger file: {}", saved.trigger_path.display());
                println!("Track map: {}", saved.tracks_path.display());
            }
            None => println!("No saved settings"),
        }
        return Ok(());
    }

    println!("{}", store.path().display());
    Ok(())
}

fn config_cmd(args: cli::ConfigArgs) -> anyhow::Result<()> {
    if args.init {
        let path = config::Config::init_default()?;
        println!("Initialized config at {}", path.display());
        return Ok(());
    }

    if args.show {
        let config = config::Config::load()?;
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    if args.validate {
        let config = config::Config::load()?;
        config.validate()?;
        println!("Config OK");
        return Ok(());
    }

    let path = config::Config::default_path()?;
    println!("{}", path.display());
    Ok(())
}

fn system_info(args: cli::SystemInfoArgs) -> anyhow::Result<()> {
    let info = system::detect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("OS: {}", info.os);
    println!("Arch: {}", info.arch);
    println!(
        "Player: {} {}",
        info.player.command,
        info.player.args.join(" ")
    );

    Ok(())
}
