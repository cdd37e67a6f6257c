//! Runtime settings from the environment (optionally a `.env` file).

mod settings;

pub use settings::{ClientSettings, ServerSettings};
