use crate::drive_info::{parse_drive_json, DRIVE_QUERY};
use async_trait::async_trait;
use drivefmt_core::{DriveFmtError, Volume, VolumeSource};
use tokio::process::Command;

const CREATE_NO_WINDOW: u32 = 0x08000000;

/// Enumerates logical drives through `System.IO.DriveInfo`.
#[derive(Debug, Default)]
pub struct WindowsVolumeSource;

impl WindowsVolumeSource {
    async fn query_drives(&self) -> Result<String, DriveFmtError> {
        let output = Command::new("powershell.exe")
            .creation_flags(CREATE_NO_WINDOW)
            .args(["-NoProfile", "-NonInteractive", "-Command", DRIVE_QUERY])
            .output()
            .await
            .map_err(|e| DriveFmtError::Enumeration(format!("Failed to run PowerShell: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DriveFmtError::Enumeration(format!(
                "PowerShell drive query failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl VolumeSource for WindowsVolumeSource {
    async fn volumes(&self) -> Result<Vec<Volume>, DriveFmtError> {
        let json = self.query_drives().await?;
        let volumes = parse_drive_json(&json)?;
        log::info!("Enumerated {} logical drives", volumes.len());
        Ok(volumes)
    }
}
