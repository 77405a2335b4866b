use serde_json::Value;
use std::io::{self, Read};

/// Read a deal piped on stdin (`cat deal.json | absw simulate`).
///
/// `None` when stdin is an interactive terminal or the pipe is empty, so
/// the caller can ask for `--input` instead.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let deal = buffer.trim();
    if deal.is_empty() {
        return Ok(None);
    }

    serde_json::from_str(deal)
        .map(Some)
        .map_err(|e| format!("Failed to parse deal from stdin: {}", e).into())
}
