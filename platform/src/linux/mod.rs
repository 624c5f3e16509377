pub mod volume;

pub use volume::LinuxVolumeSource;
