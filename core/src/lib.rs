pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod process;
pub mod safety;
pub mod test_utils;
pub mod volume;

pub use config::{FormatterConfig, Interpreter};
pub use console::{Console, StdoutConsole};
pub use dispatch::{Command, Dispatcher};
pub use error::DriveFmtError;
pub use format::{
    FormatCommand, FormatExecutor, FormatInvoker, FormatOutcome, FormatStatus, OutputLine,
    OutputStream, RunningFormat, TargetReport,
};
pub use process::ShellExecutor;
pub use safety::{can_format, EnvSystemDrive, FixedSystemDrive, SystemDriveProvider};
pub use volume::{normalize_identifier, Volume, VolumeKind, VolumeSource};
