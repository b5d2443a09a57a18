//! Configuration file for the tile engine.
//!
//! ```no_run
//! use tilebundle::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! println!("bucket: {}", config.store.bucket);
//! # Ok::<(), tilebundle::config::ConfigFileError>(())
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::{
    DEFAULT_MEMORY_CACHE_SIZE, ENV_ACCESS_KEY, ENV_SECRET_KEY, MAX_MANIFEST_TTL_SECS,
    MIN_MANIFEST_TTL_SECS,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheSettings, ConfigFile, LoggingSettings, ManifestSettings, PreloadSettings, StoreSettings,
};
pub use size::{format_size, parse_size, Size, SizeParseError};
pub use writer::to_config_string;
