use anyhow::Result;
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"# calltap configuration

[assets]
dev_mode = true

# Each drill wraps a catalog function (square, concat, echo, repeat) in
# failure injection, a call counter and an interceptor, then calls it
# `calls` times.
[[drill]]
name = "flaky-square"
function = "square"
tries_before_success = 2
calls = 4
args = [7]

[[drill]]
name = "concat"
function = "concat"
calls = 1
args = ["foo"]
kwargs = { kwarg = "bar" }

[[drill]]
name = "always-down"
function = "echo"
tries_before_success = "infinity"
calls = 3
args = ["hello"]
"#;

/// Initialize a new config file
pub fn run_init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config already exists at {:?}", path);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    println!("Created config at {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("calltap.toml");

        run_init(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calltap.toml");
        std::fs::write(&path, "keep me").unwrap();

        let err = run_init(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }
}
