//! # Configuration
//!
//! Server settings, layered from built-in defaults, `config/default.toml`,
//! `config/{RUN_ENV}.toml`, `.env` and `APP__*` environment variables.
//! Without a database URL the server runs on in-memory storage.
//!
//! ```rust,ignore
//! let settings = live_classroom::config::Settings::load()?;
//! ```

mod settings;

pub use settings::*;
