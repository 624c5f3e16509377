use async_trait::async_trait;
use drivefmt_core::{DriveFmtError, Volume, VolumeKind, VolumeSource};
use std::fs;
use std::path::{Path, PathBuf};

/// Kernel and virtual filesystems that are not storage volumes.
const PSEUDO_FILESYSTEMS: &[&str] = &[
    "proc", "sysfs", "devtmpfs", "devpts", "cgroup", "cgroup2", "securityfs", "pstore",
    "debugfs", "tracefs", "mqueue", "hugetlbfs", "configfs", "fusectl", "bpf", "autofs",
    "binfmt_misc", "efivarfs", "rpc_pipefs", "nsfs", "selinuxfs",
];

const NETWORK_FILESYSTEMS: &[&str] = &[
    "nfs", "nfs4", "cifs", "smb3", "smbfs", "9p", "ceph", "glusterfs", "fuse.sshfs", "afs",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub source: String,
    pub mount_point: String,
    pub fs_type: String,
}

/// Parse `/proc/mounts`, undoing the kernel's octal escapes (`\040` etc).
pub fn parse_mounts(contents: &str) -> Vec<MountEntry> {
    contents
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let source = parts.next()?;
            let mount_point = parts.next()?;
            let fs_type = parts.next()?;
            Some(MountEntry {
                source: unescape_octal(source),
                mount_point: unescape_octal(mount_point),
                fs_type: fs_type.to_string(),
            })
        })
        .collect()
}

fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let digits = bytes
            .get(i + 1..i + 4)
            .filter(|d| d.iter().all(|b| (b'0'..=b'7').contains(b)));
        match digits {
            Some(d) if bytes[i] == b'\\' => {
                let value = d
                    .iter()
                    .fold(0u32, |acc, digit| acc * 8 + (digit - b'0') as u32);
                out.push(value as u8);
                i += 4;
            }
            _ => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Enumerates mounted filesystems from procfs.
pub struct LinuxVolumeSource {
    mounts_path: PathBuf,
    by_label_dir: PathBuf,
    sys_block_dir: PathBuf,
}

impl Default for LinuxVolumeSource {
    fn default() -> Self {
        Self::with_roots("/proc/mounts", "/dev/disk/by-label", "/sys/block")
    }
}

impl LinuxVolumeSource {
    pub fn with_roots(
        mounts_path: impl Into<PathBuf>,
        by_label_dir: impl Into<PathBuf>,
        sys_block_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mounts_path: mounts_path.into(),
            by_label_dir: by_label_dir.into(),
            sys_block_dir: sys_block_dir.into(),
        }
    }

    fn label_for(&self, source: &str) -> String {
        let Ok(device) = fs::canonicalize(source) else {
            return String::new();
        };
        let Ok(entries) = fs::read_dir(&self.by_label_dir) else {
            return String::new();
        };

        for entry in entries.flatten() {
            if fs::canonicalize(entry.path()).ok().as_deref() == Some(device.as_path()) {
                // udev escapes spaces and slashes as \x20, \x2f
                return entry
                    .file_name()
                    .to_string_lossy()
                    .replace("\\x20", " ")
                    .replace("\\x2f", "/");
            }
        }
        String::new()
    }

    fn is_removable(&self, source: &str) -> bool {
        let Some(name) = Path::new(source).file_name().map(|n| n.to_string_lossy().into_owned())
        else {
            return false;
        };

        let disk = if self.sys_block_dir.join(&name).exists() {
            name
        } else {
            parent_disk(&name)
        };

        fs::read_to_string(self.sys_block_dir.join(disk).join("removable"))
            .map(|content| content.trim() == "1")
            .unwrap_or(false)
    }

    fn kind_for(&self, entry: &MountEntry) -> VolumeKind {
        let fs_type = entry.fs_type.as_str();
        if NETWORK_FILESYSTEMS.contains(&fs_type) {
            VolumeKind::Network
        } else if matches!(fs_type, "tmpfs" | "ramfs") {
            VolumeKind::Ram
        } else if matches!(fs_type, "iso9660" | "udf") {
            VolumeKind::CdRom
        } else if entry.source.starts_with("/dev/") {
            if self.is_removable(&entry.source) {
                VolumeKind::Removable
            } else {
                VolumeKind::Fixed
            }
        } else {
            VolumeKind::Unknown
        }
    }
}

/// `sda1` -> `sda`, `nvme0n1p2` -> `nvme0n1`, `mmcblk0p1` -> `mmcblk0`.
fn parent_disk(partition: &str) -> String {
    let trimmed = partition.trim_end_matches(|c: char| c.is_ascii_digit());
    match trimmed.strip_suffix('p') {
        Some(base) if base.ends_with(|c: char| c.is_ascii_digit()) => base.to_string(),
        _ => trimmed.to_string(),
    }
}

#[async_trait]
impl VolumeSource for LinuxVolumeSource {
    async fn volumes(&self) -> Result<Vec<Volume>, DriveFmtError> {
        let contents = fs::read_to_string(&self.mounts_path).map_err(|e| {
            DriveFmtError::Enumeration(format!(
                "Failed to read {}: {}",
                self.mounts_path.display(),
                e
            ))
        })?;

        let volumes: Vec<Volume> = parse_mounts(&contents)
            .into_iter()
            .filter(|entry| !PSEUDO_FILESYSTEMS.contains(&entry.fs_type.as_str()))
            .map(|entry| {
                let label = if entry.source.starts_with("/dev/") {
                    self.label_for(&entry.source)
                } else {
                    String::new()
                };
                Volume::from_raw(&entry.mount_point, label, self.kind_for(&entry))
            })
            .collect();

        log::info!("Enumerated {} mounted volumes", volumes.len());
        Ok(volumes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mounts_unescapes_spaces() {
        let entries = parse_mounts(
            "/dev/sdb1 /media/user/My\\040Stick vfat rw,nosuid 0 0\n\
             server:/export /mnt/share nfs4 rw 0 0\n",
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].mount_point, "/media/user/My Stick");
        assert_eq!(entries[1].fs_type, "nfs4");
    }

    #[test]
    fn test_parse_mounts_skips_short_lines() {
        assert!(parse_mounts("garbage\n\n").is_empty());
    }

    #[test]
    fn test_parent_disk_names() {
        assert_eq!(parent_disk("sda1"), "sda");
        assert_eq!(parent_disk("nvme0n1p2"), "nvme0n1");
        assert_eq!(parent_disk("mmcblk0p1"), "mmcblk0");
        assert_eq!(parent_disk("sdb"), "sdb");
    }
}
