pub mod drive_info;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub mod unsupported;

#[cfg(target_os = "linux")]
pub use linux::LinuxVolumeSource as PlatformVolumeSource;

#[cfg(target_os = "windows")]
pub use windows::WindowsVolumeSource as PlatformVolumeSource;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub use unsupported::UnsupportedVolumeSource as PlatformVolumeSource;
