//! # unitpm-renderer
//!
//! Unit codec: renders an [`AppConfig`](unitpm_core::AppConfig) into systemd
//! unit text through an embedded Tera template, and decodes unit text back
//! into the same fixed schema.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use unitpm_core::AppConfig;
//! use unitpm_renderer::{parser, RenderOptions, UnitRenderer};
//!
//! fn roundtrip(config: &AppConfig) {
//!     let opts = RenderOptions {
//!         log_dir: PathBuf::from("/tmp/logs"),
//!         default_cwd: PathBuf::from("/tmp"),
//!         user: None,
//!     };
//!     if let Ok(renderer) = UnitRenderer::new() {
//!         if let Ok((_, text)) = renderer.render_app("pm2-0-api", config, &opts) {
//!             let decoded = parser::parse("pm2-0-api", &text);
//!             assert_eq!(decoded.script, config.script);
//!         }
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod exec;
pub mod parser;

pub use context::UnitContext;
pub use engine::{log_paths, RenderOptions, UnitRenderer};
pub use error::RenderError;
pub use exec::ExecResolver;
