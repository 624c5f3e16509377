use crate::config::Interpreter;
use crate::format::{FormatCommand, FormatExecutor, OutputLine, OutputStream, RunningFormat};
use crate::DriveFmtError;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Runs the format command line through the OS command interpreter.
#[derive(Debug, Clone, Default)]
pub struct ShellExecutor {
    interpreter: Interpreter,
}

impl ShellExecutor {
    pub fn new(interpreter: Interpreter) -> Self {
        Self { interpreter }
    }

    /// Spawn `<interpreter> <switch> <command_line>` with both output streams
    /// piped. Each stream gets its own reader task; both feed one channel.
    pub fn spawn_line(&self, command_line: &str) -> Result<RunningFormat, DriveFmtError> {
        let mut std_cmd = std::process::Command::new(&self.interpreter.program);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            // cmd.exe parses its own command line; hand it over untouched.
            std_cmd.raw_arg(&self.interpreter.switch);
            std_cmd.raw_arg(command_line);
            std_cmd.creation_flags(CREATE_NO_WINDOW);
        }

        #[cfg(not(windows))]
        {
            std_cmd.arg(&self.interpreter.switch);
            std_cmd.arg(command_line);
        }

        std_cmd.stdout(Stdio::piped());
        std_cmd.stderr(Stdio::piped());
        let mut cmd = Command::from(std_cmd);

        let mut child = cmd.spawn().map_err(|source| DriveFmtError::Spawn {
            command: format!("{} {}", self.interpreter, command_line),
            source,
        })?;
        tracing::info!(
            "Started `{} {}` (pid {:?})",
            self.interpreter,
            command_line,
            child.id()
        );

        let (line_tx, line_rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, OutputStream::Stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, OutputStream::Stderr, line_tx.clone()));
        }
        drop(line_tx);

        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(async move {
            let status = child.wait().await.map(|status| status.code());
            let _ = exit_tx.send(status);
        });

        Ok(RunningFormat {
            output: line_rx,
            exit: exit_rx,
        })
    }
}

impl FormatExecutor for ShellExecutor {
    fn spawn(&self, command: &FormatCommand) -> Result<RunningFormat, DriveFmtError> {
        self.spawn_line(&command.command_line())
    }
}

/// Forward one stream line by line, decoding as UTF-8 (lossy).
async fn forward_lines<R>(reader: R, stream: OutputStream, tx: mpsc::UnboundedSender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                if tx.send(OutputLine { stream, text }).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("Stopped reading {:?} of the format process: {}", stream, e);
                break;
            }
        }
    }
}
