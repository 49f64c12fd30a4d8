use std::io::{self, BufRead, Read, Write};

use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::resource::{Confirm, ResourceSpec};
use crate::store::record::ContentRecord;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// One line per record: id followed by the resource's search fields
pub fn output_records(output_format: &OutputFormat, spec: &ResourceSpec, records: &[ContentRecord]) -> anyhow::Result<()> {
    if records.is_empty() {
        return output_empty_collection(output_format, spec.name, &format!("No {} found", spec.name));
    }

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ spec.name: records }))?);
        }
        OutputFormat::Text => {
            for record in records {
                let summary: Vec<&str> = spec
                    .search_fields
                    .iter()
                    .filter_map(|field| record.text(field))
                    .filter(|value| !value.is_empty())
                    .collect();
                println!("{:<38} {}", record.id().unwrap_or_else(|| "-".into()), summary.join(" | "));
            }
        }
    }
    Ok(())
}

/// Read a JSON object from stdin
pub fn read_json_stdin() -> anyhow::Result<Value> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        return Err(anyhow::anyhow!("Expected a JSON object on stdin"));
    }
    Ok(serde_json::from_str(&buffer)?)
}

/// Print `message` and read one trimmed line
pub fn prompt(message: &str) -> anyhow::Result<String> {
    eprint!("{}", message);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// y/N prompt on the terminal
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        match prompt(&format!("{} [y/N] ", message)) {
            Ok(answer) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

/// Content type from a file extension, for storage uploads
pub fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types() {
        assert_eq!(guess_content_type("letter.JPG"), "image/jpeg");
        assert_eq!(guess_content_type("scan.pdf"), "application/pdf");
        assert_eq!(guess_content_type("noext"), "application/octet-stream");
    }
}
