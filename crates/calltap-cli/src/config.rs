use anyhow::{Context, Result};
use calltap_runtime::{AssetPaths, CallArgs, FailureBudget};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub assets: AssetPaths,

    #[serde(default, rename = "drill")]
    pub drills: Vec<DrillConfig>,
}

/// One fault drill: a catalog function wrapped in failure injection,
/// counting and interception, invoked `calls` times
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DrillConfig {
    pub name: String,

    /// Catalog function to wrap
    pub function: String,

    #[serde(default = "default_tries")]
    pub tries_before_success: FailureBudget,

    #[serde(default = "default_calls")]
    pub calls: u32,

    #[serde(default)]
    pub args: Vec<Value>,

    #[serde(default)]
    pub kwargs: BTreeMap<String, Value>,
}

impl DrillConfig {
    pub fn call_args(&self) -> CallArgs {
        CallArgs {
            positional: self.args.clone(),
            keyword: self.kwargs.clone(),
        }
    }
}

fn default_tries() -> FailureBudget {
    FailureBudget::Finite(0)
}

fn default_calls() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assets: AssetPaths::default(),
            drills: vec![DrillConfig {
                name: "flaky-square".to_string(),
                function: "square".to_string(),
                tries_before_success: FailureBudget::Finite(2),
                calls: 4,
                args: vec![Value::from(7)],
                kwargs: BTreeMap::new(),
            }],
        }
    }
}

/// Load config from file or use defaults
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        let content =
            fs::read_to_string(path).context(format!("Failed to read config file: {:?}", path))?;

        parse_config(&content)
    } else {
        Ok(Config::default())
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).context("Failed to parse TOML config")
}
