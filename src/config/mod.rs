//! Configuration: data-directory resolution and persisted user settings

pub mod paths;
pub mod settings;

pub use paths::EnvelopePaths;
pub use settings::Settings;
