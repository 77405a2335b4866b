use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Load a deal file given by `--input` and deserialise it.
///
/// Relative paths resolve against the working directory.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let deal_path = resolve_deal_path(path)?;
    let contents = fs::read_to_string(&deal_path)
        .map_err(|e| format!("Failed to read deal '{}': {}", deal_path.display(), e))?;
    let deal: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Invalid deal JSON in '{}': {}", deal_path.display(), e))?;
    Ok(deal)
}

fn resolve_deal_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let deal_path = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !deal_path.is_file() {
        let reason = if deal_path.exists() { "not a file" } else { "not found" };
        return Err(format!("Deal file {}: {}", reason, deal_path.display()).into());
    }

    Ok(deal_path)
}
