use super::Notifier;
use crate::error::NotifyError;
use crate::models::StatusRecord;
use async_trait::async_trait;
use chrono::Local;
use colored::Colorize;
use std::io::Write;
use std::process::Stdio;
use std::sync::Mutex;
use tokio::process::Command;

const BELL: &str = "\x07";

/// Alerts on the terminal: a bell, then one highlighted line per record,
/// optionally followed by a sound command
pub struct ConsoleNotifier {
    bell: bool,
    // Serializes alerts from concurrent workers so lines never interleave
    out: Mutex<Box<dyn Write + Send>>,
    sound_command: Vec<String>,
}

impl ConsoleNotifier {
    /// Notifier writing to stdout
    pub fn stdout(bell: bool) -> Self {
        Self::with_writer(bell, Box::new(std::io::stdout()))
    }

    pub fn with_writer(bell: bool, out: Box<dyn Write + Send>) -> Self {
        Self {
            bell,
            out: Mutex::new(out),
            sound_command: Vec::new(),
        }
    }

    /// Run `command` (program then arguments) after every alert; empty disables it
    pub fn with_sound_command(mut self, command: Vec<String>) -> Self {
        self.sound_command = command;
        self
    }

    async fn play_sound(&self) -> Result<(), NotifyError> {
        let Some((program, args)) = self.sound_command.split_first() else {
            return Ok(());
        };

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| NotifyError::Sound {
                program: program.clone(),
                detail: e.to_string(),
            })?;

        if !status.success() {
            return Err(NotifyError::Sound {
                program: program.clone(),
                detail: status.to_string(),
            });
        }
        Ok(())
    }
}

/// `[HH:MM:SS] <identifier> field: value | field: value`
pub fn format_alert(timestamp: &str, identifier: &str, record: &StatusRecord) -> String {
    format!(
        "{} {} {}",
        format!("[{}]", timestamp).bright_black(),
        identifier.cyan().bold(),
        record.to_string().green()
    )
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, identifier: &str, record: &StatusRecord) -> Result<(), NotifyError> {
        let line = format_alert(&Local::now().format("%H:%M:%S").to_string(), identifier, record);

        {
            let mut out = self
                .out
                .lock()
                .map_err(|_| NotifyError::Other("alert output lock poisoned".to_string()))?;

            if self.bell {
                out.write_all(BELL.as_bytes())?;
            }
            writeln!(out, "{}", line)?;
            out.flush()?;
        }

        self.play_sound().await
    }
}
