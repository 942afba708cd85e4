//! External audio player
//!
//! Playback runs an external program with the audio file as its only
//! positional argument and waits for it to finish. A failing player is
//! reported as a warning and never aborts speech.

use crate::platform::check_executable;
use log::{debug, warn};
use std::path::Path;
use std::process::{Command, Stdio};

/// Result of one playback attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Playback {
    /// The player exited successfully
    Completed,
    /// The player failed to start or exited non-zero
    Warning(String),
}

/// Something that can play an audio file to the user
pub trait AudioPlayer: Send + Sync {
    /// Play `path`, blocking until playback has finished
    fn play(&self, path: &Path) -> Playback;

    /// Whether the player can run on this machine
    fn is_installed(&self) -> bool {
        true
    }
}

/// Player backed by an external executable (sox `play` by default)
pub struct CommandPlayer {
    program: String,
}

impl CommandPlayer {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl AudioPlayer for CommandPlayer {
    fn play(&self, path: &Path) -> Playback {
        debug!("Executing {} {}", self.program, path.display());

        let output = Command::new(&self.program)
            .arg(path)
            .stdin(Stdio::null())
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                warn!("Failed to start player '{}': {}", self.program, e);
                return Playback::Warning(format!("failed to start {}: {}", self.program, e));
            }
        };

        let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));
        let diagnostics = diagnostics.trim();
        if !diagnostics.is_empty() {
            debug!("Output was: '{}'", diagnostics);
        }

        if output.status.success() {
            Playback::Completed
        } else {
            warn!(
                "Player '{}' exited with {} for {}",
                self.program,
                output.status,
                path.display()
            );
            Playback::Warning(format!("{} exited with {}", self.program, output.status))
        }
    }

    fn is_installed(&self) -> bool {
        check_executable(&self.program)
    }
}
