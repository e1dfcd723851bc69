use serde::{Deserialize, Serialize};

const ASSET_URL_PREFIX: &str = "/assets";
const BUILD_DIR: &str = "build";

/// Static asset path resolution for dev and prod layouts
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetPaths {
    #[serde(default = "default_dev_mode")]
    pub dev_mode: bool,
}

fn default_dev_mode() -> bool {
    true
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            dev_mode: default_dev_mode(),
        }
    }
}

impl AssetPaths {
    pub fn new(dev_mode: bool) -> Self {
        Self { dev_mode }
    }

    /// URL under which a static asset is served
    pub fn static_asset_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{ASSET_URL_PREFIX}{path}")
        } else {
            format!("{ASSET_URL_PREFIX}/{path}")
        }
    }

    /// Directory holding static assets: the source tree in dev mode,
    /// the build output otherwise
    pub fn static_asset_filepath(&self) -> &'static str {
        if self.dev_mode {
            ""
        } else {
            BUILD_DIR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_asset_url() {
        let paths = AssetPaths::default();
        assert_eq!(
            paths.static_asset_url("/images/subjects/Lightbulb.svg"),
            "/assets/images/subjects/Lightbulb.svg"
        );
        assert_eq!(paths.static_asset_url("logo.png"), "/assets/logo.png");
    }

    #[test]
    fn test_static_asset_filepath_by_mode() {
        assert_eq!(AssetPaths::new(true).static_asset_filepath(), "");
        assert_eq!(AssetPaths::new(false).static_asset_filepath(), "build");
    }

    #[test]
    fn test_dev_mode_defaults_on() {
        let paths: AssetPaths = serde_json::from_str("{}").unwrap();
        assert!(paths.dev_mode);
    }
}
