use tracing::{debug, warn};

use crate::error::{KinoError, Result};

/// How the configured (or detected) player expects the resume position:
/// the flag text, and whether it needs a trailing space (and thus becomes
/// its own argv entry) or is glued to the seconds value (spec §6.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartFlag(String);

impl StartFlag {
    pub fn new(flag: impl Into<String>) -> Self {
        Self(flag.into())
    }

    /// Detects the resume flag for a handful of common players by binary
    /// name, when the user hasn't configured one explicitly (spec §6.4).
    pub fn detect(player_command: &str) -> Option<Self> {
        let name = player_command.rsplit(['/', '\\']).next().unwrap_or(player_command);
        let name = name.trim_end_matches(".exe").to_ascii_lowercase();
        let flag = match name.as_str() {
            "mpv" => "--start=",
            "vlc" => "--start-time=",
            "iina" => "--mpv-start=",
            "potplayer" | "potplayermini" | "potplayermini64" => "/seek=",
            _ => return None,
        };
        Some(Self::new(flag))
    }

    /// Renders `[start_flag + seconds, url]` as the one or two trailing
    /// argv entries the player is invoked with. A flag ending in a space is
    /// split into its own argument; otherwise it's glued to the value.
    fn render(&self, seconds: u64) -> Vec<String> {
        if self.0.ends_with(' ') {
            vec![self.0.trim_end().to_string(), seconds.to_string()]
        } else {
            vec![format!("{}{}", self.0, seconds)]
        }
    }
}

/// Launches an external media player, or falls back to the OS URL opener
/// when no player command is configured (spec §6.4).
pub struct PlayerLauncher {
    command: Option<String>,
    args: Vec<String>,
    start_flag: Option<StartFlag>,
}

impl PlayerLauncher {
    pub fn new(command: Option<String>, args: Vec<String>, start_flag: Option<StartFlag>) -> Self {
        Self { command, args, start_flag }
    }

    /// Launches `url`, seeking to `start_offset_secs` if a start flag is
    /// configured or detectable. Does not wait for the child to exit.
    pub fn launch(&self, url: &str, start_offset_secs: u64) -> Result<()> {
        let Some(command) = &self.command else {
            debug!(url, "no player configured, opening via OS default handler");
            return open::that(url).map_err(|e| KinoError::Adapter(format!("failed to open {url}: {e}")));
        };

        let flag = self
            .start_flag
            .clone()
            .or_else(|| StartFlag::detect(command));

        let mut argv = self.args.clone();
        if start_offset_secs > 0 {
            if let Some(flag) = &flag {
                argv.extend(flag.render(start_offset_secs));
            }
        }
        argv.push(url.to_string());

        debug!(command, ?argv, "launching external player");
        std::process::Command::new(command)
            .args(&argv)
            .spawn()
            .map(|_child| ())
            .map_err(|e| {
                warn!(command, error = %e, "failed to spawn player process");
                KinoError::Adapter(format!("failed to launch {command}: {e}"))
            })
    }
}
