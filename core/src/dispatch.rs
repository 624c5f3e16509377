use crate::format::{FormatExecutor, FormatInvoker};
use crate::{Console, DriveFmtError, FormatterConfig, VolumeSource};
use std::sync::Arc;

pub const HELP_TOKENS: &[&str] = &["?", "/?", "-h", "--help"];
pub const LIST_TOKENS: &[&str] = &["--list", "-l"];

/// The single action one invocation performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Format(Vec<String>),
}

impl Command {
    /// Help wins over everything, list wins over format targets. Matching is
    /// case-sensitive and position-independent.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let has_any = |tokens: &[&str]| {
            args.iter()
                .any(|a| tokens.iter().any(|t| *t == a.as_ref()))
        };

        if args.is_empty() || has_any(HELP_TOKENS) {
            Command::Help
        } else if has_any(LIST_TOKENS) {
            Command::List
        } else {
            Command::Format(
                args.iter()
                    .map(|a| a.as_ref())
                    .filter(|a| !a.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        }
    }
}

pub fn usage(program_name: &str) -> Vec<String> {
    let name = program_name.to_uppercase();
    vec![
        "No command arguments were passed.".to_string(),
        "Formats drives from Windows system.".to_string(),
        format!("{} D: E: F: G: H:", name),
        format!("{} --list", name),
    ]
}

pub struct Dispatcher {
    config: FormatterConfig,
    volumes: Arc<dyn VolumeSource>,
    invoker: FormatInvoker,
}

impl Dispatcher {
    pub fn new(
        config: FormatterConfig,
        volumes: Arc<dyn VolumeSource>,
        executor: Arc<dyn FormatExecutor>,
    ) -> Self {
        let invoker = FormatInvoker::new(executor, config.system_drive.clone());
        Self {
            config,
            volumes,
            invoker,
        }
    }

    /// Errors returned here are internal failures; per-target problems are
    /// reported on the console and never surface as `Err`.
    pub async fn run(
        &self,
        command: &Command,
        console: &mut dyn Console,
    ) -> Result<(), DriveFmtError> {
        tracing::debug!("Dispatching {:?}", command);
        match command {
            Command::Help => {
                for line in usage(&self.config.program_name) {
                    console.line(&line);
                }
            }
            Command::List => {
                let volumes = self.volumes.volumes().await?;
                tracing::debug!("Listing {} volumes", volumes.len());
                for volume in &volumes {
                    console.line(&volume.to_string());
                }
            }
            Command::Format(targets) => {
                let volumes = self.volumes.volumes().await?;
                self.invoker.format_all(&volumes, targets, console).await?;
                console.line("All done.");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_shows_help() {
        assert_eq!(Command::from_args::<&str>(&[]), Command::Help);
    }

    #[test]
    fn test_help_token_anywhere_wins() {
        for token in HELP_TOKENS {
            assert_eq!(Command::from_args(&["D:", *token, "--list"]), Command::Help);
        }
    }

    #[test]
    fn test_help_tokens_are_case_sensitive() {
        assert_eq!(
            Command::from_args(&["--HELP"]),
            Command::Format(vec!["--HELP".to_string()])
        );
    }

    #[test]
    fn test_list_beats_format_targets() {
        assert_eq!(Command::from_args(&["D:", "-l"]), Command::List);
        assert_eq!(Command::from_args(&["--list", "E:"]), Command::List);
    }

    #[test]
    fn test_format_targets_keep_order_and_drop_empty() {
        assert_eq!(
            Command::from_args(&["E:", "", "D:"]),
            Command::Format(vec!["E:".to_string(), "D:".to_string()])
        );
    }

    #[test]
    fn test_usage_uses_upper_case_program_name() {
        let lines = usage("drivefmt");
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "DRIVEFMT D: E: F: G: H:");
        assert_eq!(lines[3], "DRIVEFMT --list");
    }
}
