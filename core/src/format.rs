use crate::safety::{check_target, validate_label, Rejection, SystemDriveProvider};
use crate::{Console, DriveFmtError, Volume};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// The OS format command for one volume: `format D: [/v:LABEL] /q /x /y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatCommand {
    pub identifier: String,
    pub label: Option<String>,
}

impl FormatCommand {
    pub fn new(identifier: impl Into<String>, label: &str) -> Self {
        Self {
            identifier: identifier.into(),
            label: (!label.is_empty()).then(|| label.to_string()),
        }
    }

    pub fn for_volume(volume: &Volume) -> Self {
        Self::new(volume.identifier.clone(), &volume.label)
    }

    /// Labels must have passed `validate_label` before they get here.
    pub fn command_line(&self) -> String {
        match &self.label {
            None => format!("format {} /q /x /y", self.identifier),
            Some(label) if label.contains(' ') => {
                format!("format {} /v:\"{}\" /q /x /y", self.identifier, label)
            }
            Some(label) => format!("format {} /v:{} /q /x /y", self.identifier, label),
        }
    }
}

impl fmt::Display for FormatCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Normalized result of the format utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStatus {
    Success,
    InvalidParameters,
    UserDeclined,
    FatalError,
}

impl FormatStatus {
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            0 => FormatStatus::Success,
            1 => FormatStatus::InvalidParameters,
            5 => FormatStatus::UserDeclined,
            _ => FormatStatus::FatalError,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FormatStatus::Success => "Success",
            FormatStatus::InvalidParameters => "Incorrect parameters",
            FormatStatus::UserDeclined => "User pressed N in response to the prompt.",
            FormatStatus::FatalError => "A fatal error occurred.",
        }
    }
}

impl fmt::Display for FormatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

impl OutputLine {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stdout,
            text: text.into(),
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stream: OutputStream::Stderr,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    pub status: FormatStatus,
    /// `None` when the process ended without an exit code (killed by a signal).
    pub exit_code: Option<i32>,
    pub output: Vec<OutputLine>,
}

impl FormatOutcome {
    pub fn new(exit_code: Option<i32>, output: Vec<OutputLine>) -> Self {
        let status = exit_code
            .map(FormatStatus::from_exit_code)
            .unwrap_or(FormatStatus::FatalError);
        Self {
            status,
            exit_code,
            output,
        }
    }
}

/// A started format process: its merged output lines, then its exit code.
///
/// `output` closes once both of the process's streams are drained.
pub struct RunningFormat {
    pub output: mpsc::UnboundedReceiver<OutputLine>,
    pub exit: oneshot::Receiver<std::io::Result<Option<i32>>>,
}

/// Starts the format utility for a command.
pub trait FormatExecutor: Send + Sync {
    /// Must be called from within a tokio runtime.
    fn spawn(&self, command: &FormatCommand) -> Result<RunningFormat, DriveFmtError>;
}

/// Terminal state of one requested target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetReport {
    NotFound,
    Rejected(Rejection),
    StartFailed(String),
    Completed(FormatOutcome),
}

/// Resolves, validates and formats requested targets one after another.
pub struct FormatInvoker {
    executor: Arc<dyn FormatExecutor>,
    system_drive: Arc<dyn SystemDriveProvider>,
}

impl FormatInvoker {
    pub fn new(
        executor: Arc<dyn FormatExecutor>,
        system_drive: Arc<dyn SystemDriveProvider>,
    ) -> Self {
        Self {
            executor,
            system_drive,
        }
    }

    /// Every target is attempted; a failure on one never stops the rest.
    pub async fn format_all(
        &self,
        volumes: &[Volume],
        targets: &[String],
        console: &mut dyn Console,
    ) -> Result<Vec<(String, TargetReport)>, DriveFmtError> {
        let mut reports = Vec::with_capacity(targets.len());
        for token in targets.iter().filter(|t| !t.is_empty()) {
            let report = self.format_one(volumes, token, console).await?;
            tracing::debug!("Target {} finished: {:?}", token, report);
            reports.push((token.clone(), report));
        }
        Ok(reports)
    }

    pub async fn format_one(
        &self,
        volumes: &[Volume],
        token: &str,
        console: &mut dyn Console,
    ) -> Result<TargetReport, DriveFmtError> {
        let Some(volume) = volumes.iter().find(|v| v.identifier == token) else {
            console.line(&format!("Drive not found. {}", token));
            return Ok(TargetReport::NotFound);
        };

        console.line(&format!("Drive found. {}", token));
        console.line(&volume.to_string());
        console.line("Formatting drive...");

        if let Err(rejection) = self.check_eligible(volume) {
            tracing::warn!("Refusing to format {}: {}", volume.identifier, rejection);
            let message = match &rejection {
                Rejection::UnsafeLabel(_) => format!(
                    "Cannot format the drive {}. Its label \"{}\" contains characters that \
                     cannot be passed to the format utility safely.",
                    volume.identifier, volume.label
                ),
                _ => format!(
                    "Cannot format the drive {}. It has either an invalid drive letter or it \
                     is the Windows system drive.",
                    volume.identifier
                ),
            };
            console.line(&message);
            return Ok(TargetReport::Rejected(rejection));
        }

        let command = FormatCommand::for_volume(volume);
        let running = match self.executor.spawn(&command) {
            Ok(running) => running,
            Err(err @ DriveFmtError::Spawn { .. }) => {
                tracing::error!("{}", err);
                console.line(&format!("Process could not be started. {}", err));
                return Ok(TargetReport::StartFailed(err.to_string()));
            }
            Err(err) => return Err(err),
        };

        console.line("Process started.");
        let outcome = drain(running, console).await?;
        console.line(&format!("Process finished. Exit STATUS: {}", outcome.status));
        Ok(TargetReport::Completed(outcome))
    }

    fn check_eligible(&self, volume: &Volume) -> Result<(), Rejection> {
        let system_drive = self.system_drive.system_drive();
        check_target(&volume.identifier, system_drive.as_deref())?;
        validate_label(&volume.label)?;
        Ok(())
    }
}

/// Single consumer of the merged stream: echoes lines in arrival order, then
/// waits for the process to exit.
async fn drain(
    running: RunningFormat,
    console: &mut dyn Console,
) -> Result<FormatOutcome, DriveFmtError> {
    let RunningFormat { mut output, exit } = running;

    let mut captured = Vec::new();
    while let Some(line) = output.recv().await {
        console.line(&line.text);
        captured.push(line);
    }

    let exit_code = exit
        .await
        .map_err(|_| {
            DriveFmtError::Wait(std::io::Error::new(
                std::io::ErrorKind::Other,
                "exit status of the format process was lost",
            ))
        })?
        .map_err(DriveFmtError::Wait)?;

    Ok(FormatOutcome::new(exit_code, captured))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::{FixedSystemDrive, LabelProblem};
    use crate::test_utils::{volume, RecordingExecutor};
    use crate::VolumeKind;

    fn invoker(executor: Arc<RecordingExecutor>) -> FormatInvoker {
        FormatInvoker::new(executor, Arc::new(FixedSystemDrive::new("C:")))
    }

    #[test]
    fn test_command_without_label() {
        assert_eq!(FormatCommand::new("D:", "").command_line(), "format D: /q /x /y");
    }

    #[test]
    fn test_command_with_label() {
        assert_eq!(
            FormatCommand::new("D:", "DATA").command_line(),
            "format D: /v:DATA /q /x /y"
        );
        assert_eq!(
            FormatCommand::new("E:", "Données").command_line(),
            "format E: /v:Données /q /x /y"
        );
    }

    #[test]
    fn test_command_quotes_labels_with_spaces() {
        assert_eq!(
            FormatCommand::new("E:", "MY DATA").command_line(),
            "format E: /v:\"MY DATA\" /q /x /y"
        );
    }

    #[test]
    fn test_exit_code_mapping() {
        assert_eq!(FormatStatus::from_exit_code(0), FormatStatus::Success);
        assert_eq!(FormatStatus::from_exit_code(1), FormatStatus::InvalidParameters);
        assert_eq!(FormatStatus::from_exit_code(5), FormatStatus::UserDeclined);
        for code in [i32::MIN, -1, 2, 3, 4, 6, 255, i32::MAX] {
            assert_eq!(FormatStatus::from_exit_code(code), FormatStatus::FatalError);
        }
    }

    #[test]
    fn test_missing_exit_code_is_fatal() {
        let outcome = FormatOutcome::new(None, vec![]);
        assert_eq!(outcome.status, FormatStatus::FatalError);
    }

    #[tokio::test]
    async fn test_every_target_is_attempted() {
        let executor = Arc::new(RecordingExecutor::with_exit_code(0));
        let volumes = vec![
            volume("C:", "Windows", VolumeKind::Fixed),
            volume("D:", "", VolumeKind::Removable),
        ];
        let targets: Vec<String> = ["D:", "Z:", "C:"].iter().map(|t| t.to_string()).collect();
        let mut console = Vec::new();

        let reports = invoker(executor.clone())
            .format_all(&volumes, &targets, &mut console)
            .await
            .unwrap();

        assert_eq!(reports.len(), 3);
        assert!(matches!(reports[0].1, TargetReport::Completed(_)));
        assert_eq!(reports[1].1, TargetReport::NotFound);
        assert_eq!(
            reports[2].1,
            TargetReport::Rejected(Rejection::SystemVolume("C:".to_string()))
        );
        assert_eq!(executor.commands(), vec!["format D: /q /x /y".to_string()]);
        assert!(console.contains(&"Drive not found. Z:".to_string()));
    }

    #[tokio::test]
    async fn test_lookup_is_exact_and_case_sensitive() {
        let executor = Arc::new(RecordingExecutor::with_exit_code(0));
        let volumes = vec![volume("D:", "", VolumeKind::Removable)];
        let mut console = Vec::new();

        let invoker = invoker(executor.clone());
        for token in ["d:", "D", "D:\\"] {
            let report = invoker.format_one(&volumes, token, &mut console).await.unwrap();
            assert_eq!(report, TargetReport::NotFound, "{token:?} should not match");
        }
        assert!(executor.commands().is_empty());
    }

    #[tokio::test]
    async fn test_unsafe_label_never_reaches_the_interpreter() {
        let executor = Arc::new(RecordingExecutor::with_exit_code(0));
        let volumes = vec![volume("D:", "X & del C:", VolumeKind::Removable)];
        let mut console = Vec::new();

        let report = invoker(executor.clone())
            .format_one(&volumes, "D:", &mut console)
            .await
            .unwrap();

        assert_eq!(
            report,
            TargetReport::Rejected(Rejection::UnsafeLabel(LabelProblem::UnsafeCharacter('&')))
        );
        assert!(executor.commands().is_empty());
    }

    #[tokio::test]
    async fn test_output_is_echoed_and_captured() {
        let executor = Arc::new(
            RecordingExecutor::with_exit_code(5).with_output(vec![
                OutputLine::stdout("Insert new disk"),
                OutputLine::stderr("Access denied"),
            ]),
        );
        let volumes = vec![volume("E:", "USB", VolumeKind::Removable)];
        let mut console = Vec::new();

        let report = invoker(executor)
            .format_one(&volumes, "E:", &mut console)
            .await
            .unwrap();

        let TargetReport::Completed(outcome) = report else {
            panic!("expected a completed format, got {report:?}");
        };
        assert_eq!(outcome.status, FormatStatus::UserDeclined);
        assert_eq!(outcome.exit_code, Some(5));
        assert_eq!(outcome.output.len(), 2);
        assert_eq!(
            console,
            vec![
                "Drive found. E:",
                "Drive Name=E:, Label=USB, Type=Removable",
                "Formatting drive...",
                "Process started.",
                "Insert new disk",
                "Access denied",
                "Process finished. Exit STATUS: User pressed N in response to the prompt.",
            ]
        );
    }

    #[tokio::test]
    async fn test_start_failure_moves_on() {
        let executor = Arc::new(RecordingExecutor::failing_to_start());
        let volumes = vec![
            volume("D:", "", VolumeKind::Removable),
            volume("E:", "", VolumeKind::Removable),
        ];
        let targets = vec!["D:".to_string(), "E:".to_string()];
        let mut console = Vec::new();

        let reports = invoker(executor.clone())
            .format_all(&volumes, &targets, &mut console)
            .await
            .unwrap();

        assert!(reports
            .iter()
            .all(|(_, r)| matches!(r, TargetReport::StartFailed(_))));
        assert_eq!(executor.commands().len(), 2);
        assert!(console
            .iter()
            .any(|l| l.starts_with("Process could not be started.")));
    }

    #[tokio::test]
    async fn test_empty_tokens_are_skipped() {
        let executor = Arc::new(RecordingExecutor::with_exit_code(0));
        let targets = vec![String::new(), String::new()];
        let mut console = Vec::new();

        let reports = invoker(executor)
            .format_all(&[], &targets, &mut console)
            .await
            .unwrap();

        assert!(reports.is_empty());
        assert!(console.is_empty());
    }
}
