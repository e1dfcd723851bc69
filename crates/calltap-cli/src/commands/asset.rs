use crate::config::Config;
use anyhow::{Context, Result};
use calltap_runtime::AssetPaths;
use serde_json::{json, Value};

/// Resolve `path` against the configured asset layout (`prod` forces the build layout)
pub fn resolve(path: &str, prod: bool, config: &Config) -> Value {
    let paths = if prod {
        AssetPaths::new(false)
    } else {
        config.assets.clone()
    };

    json!({
        "url": paths.static_asset_url(path),
        "filepath": paths.static_asset_filepath(),
        "dev_mode": paths.dev_mode,
    })
}

pub fn execute(path: &str, prod: bool, config: &Config) -> Result<()> {
    let resolved = resolve(path, prod, config);
    let rendered = serde_json::to_string_pretty(&resolved).context("Failed to serialize asset paths")?;
    println!("{}", rendered);
    Ok(())
}
