use async_trait::async_trait;
use drivefmt_core::{DriveFmtError, Volume, VolumeSource};

/// Placeholder for hosts without a volume enumerator.
#[derive(Debug, Default)]
pub struct UnsupportedVolumeSource;

#[async_trait]
impl VolumeSource for UnsupportedVolumeSource {
    async fn volumes(&self) -> Result<Vec<Volume>, DriveFmtError> {
        Err(DriveFmtError::PlatformNotSupported(format!(
            "volume enumeration is not implemented for {}",
            std::env::consts::OS
        )))
    }
}
