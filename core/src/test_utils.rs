/// Test utilities and mock implementations for safe testing.
/// Nothing in here ever touches a real volume or starts a process.
use crate::format::{FormatCommand, FormatExecutor, OutputLine, RunningFormat};
use crate::{DriveFmtError, Volume, VolumeKind, VolumeSource};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

pub fn volume(identifier: &str, label: &str, kind: VolumeKind) -> Volume {
    Volume {
        identifier: identifier.to_string(),
        label: label.to_string(),
        kind,
    }
}

/// Volume source with a fixed snapshot, or a scripted failure.
pub struct MockVolumeSource {
    volumes: Vec<Volume>,
    failure: Option<String>,
    call_count: Arc<Mutex<usize>>,
}

impl MockVolumeSource {
    pub fn with_volumes(volumes: Vec<Volume>) -> Self {
        Self {
            volumes,
            failure: None,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            volumes: vec![],
            failure: Some(message.to_string()),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockVolumeSource {
    /// A system drive, a removable stick and a network share.
    fn default() -> Self {
        Self::with_volumes(vec![
            volume("C:", "Windows", VolumeKind::Fixed),
            volume("D:", "USBSTICK", VolumeKind::Removable),
            volume("Z:", "", VolumeKind::Network),
        ])
    }
}

#[async_trait::async_trait]
impl VolumeSource for MockVolumeSource {
    async fn volumes(&self) -> Result<Vec<Volume>, DriveFmtError> {
        *self.call_count.lock().unwrap() += 1;
        match &self.failure {
            Some(message) => Err(DriveFmtError::Enumeration(message.clone())),
            None => Ok(self.volumes.clone()),
        }
    }
}

/// Executor that records command lines and replays scripted output.
pub struct RecordingExecutor {
    exit_code: Option<i32>,
    output: Vec<OutputLine>,
    fail_to_start: bool,
    commands: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn with_exit_code(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            output: vec![],
            fail_to_start: false,
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Simulates a process killed without an exit code.
    pub fn without_exit_code() -> Self {
        Self {
            exit_code: None,
            ..Self::with_exit_code(0)
        }
    }

    pub fn failing_to_start() -> Self {
        Self {
            fail_to_start: true,
            ..Self::with_exit_code(0)
        }
    }

    pub fn with_output(mut self, output: Vec<OutputLine>) -> Self {
        self.output = output;
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl FormatExecutor for RecordingExecutor {
    fn spawn(&self, command: &FormatCommand) -> Result<RunningFormat, DriveFmtError> {
        self.commands.lock().unwrap().push(command.command_line());

        if self.fail_to_start {
            return Err(DriveFmtError::Spawn {
                command: command.command_line(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "mock interpreter missing",
                ),
            });
        }

        let (line_tx, line_rx) = mpsc::unbounded_channel();
        for line in &self.output {
            let _ = line_tx.send(line.clone());
        }
        let (exit_tx, exit_rx) = oneshot::channel();
        let _ = exit_tx.send(Ok(self.exit_code));

        Ok(RunningFormat {
            output: line_rx,
            exit: exit_rx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_source_counts_calls() {
        let source = MockVolumeSource::default();
        let volumes = tokio_test::block_on(source.volumes()).unwrap();
        assert_eq!(volumes.len(), 3);
        assert_eq!(source.call_count(), 1);
    }

    #[test]
    fn test_failing_source() {
        let source = MockVolumeSource::failing("device busy");
        let result = tokio_test::block_on(source.volumes());
        assert!(matches!(result, Err(DriveFmtError::Enumeration(_))));
    }
}
