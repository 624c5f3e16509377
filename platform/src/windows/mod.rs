pub mod volume;

pub use volume::WindowsVolumeSource;
