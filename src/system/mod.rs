use crate::config::PlayerConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub player: PlayerConfig,
}

pub fn detect() -> SystemInfo {
    let os = std::env::consts::OS.to_string();
    let arch = std::env::consts::ARCH.to_string();
    let player = default_player(&os);

    SystemInfo { os, arch, player }
}

fn default_player(os: &str) -> PlayerConfig {
    match os {
        "macos" => PlayerConfig {
            command: "afplay".to_string(),
            args: vec!["-v".to_string(), "{volume}".to_string(), "{path}".to_string()],
        },
        _ => PlayerConfig {
            command: "ffplay".to_string(),
            args: [
                "-nodisp",
                "-autoexit",
                "-loglevel",
                "error",
                "-volume",
                "{volume_percent}",
                "{path}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        },
    }
}
