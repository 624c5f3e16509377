use crate::safety::{EnvSystemDrive, SystemDriveProvider};
use std::fmt;
use std::sync::Arc;

/// Overrides the interpreter program used to run the format utility.
pub const SHELL_ENV: &str = "DRIVEFMT_SHELL";

pub const PROGRAM_NAME: &str = "drivefmt";

/// Command interpreter that runs the format command line, e.g. `cmd.exe /c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: String,
    pub switch: String,
}

impl Interpreter {
    pub fn new(program: impl Into<String>, switch: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            switch: switch.into(),
        }
    }

    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::new("cmd.exe", "/c")
        } else {
            Self::new("sh", "-c")
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl fmt::Display for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.program, self.switch)
    }
}

/// Runtime settings for one invocation. Nothing here is persisted.
#[derive(Clone)]
pub struct FormatterConfig {
    pub program_name: String,
    pub interpreter: Interpreter,
    pub system_drive: Arc<dyn SystemDriveProvider>,
}

impl FormatterConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(program) = std::env::var(SHELL_ENV) {
            if !program.trim().is_empty() {
                tracing::debug!("Using interpreter override from {}: {}", SHELL_ENV, program);
                config.interpreter.program = program;
            }
        }
        config
    }

    pub fn with_system_drive(mut self, provider: Arc<dyn SystemDriveProvider>) -> Self {
        self.system_drive = provider;
        self
    }
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            program_name: PROGRAM_NAME.to_string(),
            interpreter: Interpreter::platform_default(),
            system_drive: Arc::new(EnvSystemDrive::default()),
        }
    }
}

impl fmt::Debug for FormatterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatterConfig")
            .field("program_name", &self.program_name)
            .field("interpreter", &self.interpreter)
            .field("system_drive", &self.system_drive.system_drive())
            .finish()
    }
}
