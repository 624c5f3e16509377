//! Eligibility rules applied before any volume is handed to the format utility.
//!
//! A target must look like a drive letter (`D:`), must not be the volume the
//! OS boots from, and its label must be safe to place on an interpreter
//! command line.

use thiserror::Error;

/// Environment variable Windows uses to publish the system volume.
pub const SYSTEM_DRIVE_VAR: &str = "SystemDrive";

/// Longest label the format utility accepts (NTFS limit).
pub const MAX_LABEL_LEN: usize = 32;

/// Characters the command interpreter treats specially.
const UNSAFE_LABEL_CHARS: &[char] = &[
    '&', '|', '<', '>', '^', '"', '%', '!', '(', ')', ';', ',', '=', '/', '\\',
];

/// Supplies the identifier of the system/boot volume.
pub trait SystemDriveProvider: Send + Sync {
    fn system_drive(&self) -> Option<String>;
}

/// Reads the system volume from the environment on every call.
#[derive(Debug, Clone)]
pub struct EnvSystemDrive {
    var: String,
}

impl EnvSystemDrive {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvSystemDrive {
    fn default() -> Self {
        Self::new(SYSTEM_DRIVE_VAR)
    }
}

impl SystemDriveProvider for EnvSystemDrive {
    fn system_drive(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// A fixed system volume, for hosts without the variable and for tests.
#[derive(Debug, Clone, Default)]
pub struct FixedSystemDrive(pub Option<String>);

impl FixedSystemDrive {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(Some(identifier.into()))
    }
}

impl SystemDriveProvider for FixedSystemDrive {
    fn system_drive(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("`{0}` is not a drive letter")]
    InvalidIdentifier(String),

    #[error("`{0}` is the system drive")]
    SystemVolume(String),

    #[error(transparent)]
    UnsafeLabel(#[from] LabelProblem),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelProblem {
    #[error("label is {0} characters long, the limit is {}", MAX_LABEL_LEN)]
    TooLong(usize),

    #[error("label contains {0:?}")]
    UnsafeCharacter(char),
}

/// Structural and system-volume check for a target identifier.
pub fn check_target(identifier: &str, system_drive: Option<&str>) -> Result<(), Rejection> {
    let mut chars = identifier.chars();
    let well_formed = matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(letter), Some(':'), None) if letter.is_alphabetic()
    );
    if !well_formed {
        return Err(Rejection::InvalidIdentifier(identifier.to_string()));
    }

    if system_drive == Some(identifier) {
        return Err(Rejection::SystemVolume(identifier.to_string()));
    }

    Ok(())
}

/// True when `identifier` may be handed to the format utility.
pub fn can_format(identifier: &str, system_drive: Option<&str>) -> bool {
    check_target(identifier, system_drive).is_ok()
}

/// Labels are interpolated into an interpreter command line, so anything the
/// interpreter could act on is refused. Spaces are allowed and get quoted.
pub fn validate_label(label: &str) -> Result<(), LabelProblem> {
    let length = label.chars().count();
    if length > MAX_LABEL_LEN {
        return Err(LabelProblem::TooLong(length));
    }

    match label
        .chars()
        .find(|c| c.is_control() || UNSAFE_LABEL_CHARS.contains(c))
    {
        Some(c) => Err(LabelProblem::UnsafeCharacter(c)),
        None => Ok(()),
    }
}
