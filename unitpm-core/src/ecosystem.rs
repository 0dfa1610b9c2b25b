//! Ecosystem descriptor loading (`.json`, `.yaml`, `.yml`).
//!
//! `ecosystem.config.js` files are recognised but refused: running them
//! would need a JavaScript engine.

use std::path::Path;

use crate::error::CoreError;
use crate::types::EcosystemConfig;

/// True when `path` looks like an ecosystem descriptor rather than a script.
pub fn is_ecosystem_file(path: &Path) -> bool {
    let stem_hint = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.contains("ecosystem"))
        .unwrap_or(false);
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    matches!(ext, "json" | "yaml" | "yml") || stem_hint
}

fn is_javascript(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("js" | "cjs" | "mjs")
    )
}

/// Load an ecosystem file, picking the parser from the extension.
pub fn load(path: &Path) -> Result<EcosystemConfig, CoreError> {
    if is_javascript(path) {
        return Err(CoreError::JavaScriptEcosystem {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&contents).map_err(|source| CoreError::Json {
            path: path.to_path_buf(),
            source,
        }),
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&contents).map_err(|source| CoreError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Err(CoreError::UnsupportedEcosystem {
            path: path.to_path_buf(),
        }),
    }
}
