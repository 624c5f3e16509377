//! Parsing of the drive list PowerShell prints for `System.IO.DriveInfo`.
//!
//! Lives outside the `windows` module so the parser can be tested anywhere.

use drivefmt_core::{DriveFmtError, Volume, VolumeKind};
use serde::Deserialize;

/// Emits one object per logical drive. `VolumeLabel` throws for drives that
/// are not ready (empty card readers, optical drives), so it is read guarded.
/// Output is switched to UTF-8; the console default is the OEM code page.
pub const DRIVE_QUERY: &str = "[Console]::OutputEncoding = [System.Text.Encoding]::UTF8; \
    @([System.IO.DriveInfo]::GetDrives() | ForEach-Object { \
    [pscustomobject]@{ \
        Name = $_.Name; \
        VolumeLabel = $(try { $_.VolumeLabel } catch { '' }); \
        DriveType = [int]$_.DriveType \
    } \
}) | ConvertTo-Json -Compress";

#[derive(Debug, Deserialize)]
struct RawDrive {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "VolumeLabel", default)]
    volume_label: Option<String>,
    #[serde(rename = "DriveType")]
    drive_type: u32,
}

/// `System.IO.DriveType` numbering.
pub fn kind_from_drive_type(code: u32) -> VolumeKind {
    match code {
        1 => VolumeKind::NoRootDirectory,
        2 => VolumeKind::Removable,
        3 => VolumeKind::Fixed,
        4 => VolumeKind::Network,
        5 => VolumeKind::CdRom,
        6 => VolumeKind::Ram,
        _ => VolumeKind::Unknown,
    }
}

pub fn parse_drive_json(json: &str) -> Result<Vec<Volume>, DriveFmtError> {
    let json = json.trim_start_matches('\u{feff}').trim();
    if json.is_empty() {
        return Ok(vec![]);
    }

    // ConvertTo-Json collapses a single-element array into a bare object
    let parsed = if json.starts_with('[') {
        serde_json::from_str::<Vec<RawDrive>>(json)
    } else {
        serde_json::from_str::<RawDrive>(json).map(|drive| vec![drive])
    };
    let drives = parsed
        .map_err(|e| DriveFmtError::Enumeration(format!("Failed to parse drive list: {}", e)))?;

    Ok(drives
        .into_iter()
        .map(|drive| {
            if drive.volume_label.is_none() {
                log::debug!("No label reported for {}", drive.name);
            }
            Volume::from_raw(
                &drive.name,
                drive.volume_label.unwrap_or_default(),
                kind_from_drive_type(drive.drive_type),
            )
        })
        .collect())
}
