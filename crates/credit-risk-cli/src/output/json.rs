use serde_json::Value;

/// Pretty-print the result envelope to stdout.
pub fn print_json(value: &Value) {
    match render(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("failed to render result as JSON: {}", e),
    }
}

/// Decimals arrive as strings and stay that way, so money is printed
/// exactly as computed.
fn render(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}
