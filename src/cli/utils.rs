use serde_json::{json, Value};

use crate::cli::OutputFormat;

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "success": true, "message": message });
            if let Some(data) = data {
                response["data"] = data;
            }
            print_json(&response)?;
        }
        OutputFormat::Text => println!("✓ {}", message),
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "success": false, "error": message });
            if let Some(data) = data {
                response["data"] = data;
            }
            print_json(&response)?;
        }
        OutputFormat::Text => eprintln!("✗ {}", message),
    }
    Ok(())
}

/// One-line text summary of a version in wire format
pub fn version_line(version: &Value) -> String {
    let str_field = |key: &str| version.get(key).and_then(Value::as_str).unwrap_or("-").to_string();
    let id = version.get("id").and_then(Value::as_i64).unwrap_or_default();
    let item_id = version.get("item_id").and_then(Value::as_i64).unwrap_or_default();

    format!(
        "#{:<6} {}  {:<7} {}#{}  {}",
        id,
        str_field("created_at"),
        str_field("event"),
        str_field("item_type"),
        item_id,
        str_field("whodunnit"),
    )
}
