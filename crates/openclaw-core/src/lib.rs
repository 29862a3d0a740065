//! # openclaw-core
//!
//! Core library shared by OpenClaw tooling:
//! - Backup settings loading (YAML file + environment overrides)
//! - Resolution of the project, home configuration, and sessions roots
//! - Error types

pub mod error;
pub mod paths;
pub mod settings;
pub mod utils;

pub use error::{Error, Result};
pub use paths::{resolve_base_dir, resolve_sessions_dir, OpenClawPaths, SessionsResolution};
pub use settings::{BackupSettings, SettingsLoader};
pub use utils::{expand_tilde, get_home_dir, get_openclaw_dir};
