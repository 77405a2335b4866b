use serde_json::Value;

/// Pretty-print the simulation envelope (periods, summary, warnings).
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("Failed to serialise simulation output: {}", e),
    }
}
