use std::fmt;

/// One mounted volume as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub identifier: String,
    pub label: String,
    pub kind: VolumeKind,
}

/// Mount type, named the way the Windows drive-type API names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    Unknown,
    NoRootDirectory,
    Removable,
    Fixed,
    Network,
    CdRom,
    Ram,
}

impl fmt::Display for VolumeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VolumeKind::Unknown => "Unknown",
            VolumeKind::NoRootDirectory => "NoRootDirectory",
            VolumeKind::Removable => "Removable",
            VolumeKind::Fixed => "Fixed",
            VolumeKind::Network => "Network",
            VolumeKind::CdRom => "CDRom",
            VolumeKind::Ram => "Ram",
        };
        f.write_str(name)
    }
}

impl Volume {
    /// Build a volume from the raw name the OS reports, e.g. `D:\`.
    pub fn from_raw(raw_name: &str, label: impl Into<String>, kind: VolumeKind) -> Self {
        Self {
            identifier: normalize_identifier(raw_name),
            label: label.into(),
            kind,
        }
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Drive Name={}, Label={}, Type={}",
            self.identifier, self.label, self.kind
        )
    }
}

/// Strip path-separator decoration from a raw volume name (`C:\` -> `C:`).
pub fn normalize_identifier(raw_name: &str) -> String {
    raw_name.replace('\\', "")
}

#[async_trait::async_trait]
pub trait VolumeSource: Send + Sync {
    /// Fresh snapshot of every mounted volume, in the order the OS reports them.
    async fn volumes(&self) -> Result<Vec<Volume>, crate::DriveFmtError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_backslashes() {
        assert_eq!(normalize_identifier(r"C:\"), "C:");
        assert_eq!(normalize_identifier("D:"), "D:");
        assert_eq!(normalize_identifier(""), "");
    }

    #[test]
    fn test_volume_line_with_empty_label() {
        let volume = Volume::from_raw(r"E:\", "", VolumeKind::CdRom);
        assert_eq!(volume.to_string(), "Drive Name=E:, Label=, Type=CDRom");
    }

    #[test]
    fn test_volume_line_with_label() {
        let volume = Volume::from_raw(r"D:\", "DATA", VolumeKind::Removable);
        assert_eq!(volume.identifier, "D:");
        assert_eq!(volume.to_string(), "Drive Name=D:, Label=DATA, Type=Removable");
    }
}
