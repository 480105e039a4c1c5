pub mod backend;
pub mod file;
pub mod level;
pub mod tone;

pub use backend::{AudioBackend, AudioBackendConfig, AudioFrame};
pub use file::AudioFile;
pub use level::average_power_dbfs;
pub use tone::ToneBackend;
