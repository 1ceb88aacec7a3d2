use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::{AppConfig, ConfigError};

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(Value::Object(fields)) = data {
                for (key, value) in fields {
                    response[key.as_str()] = value;
                }
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
            if let Some(Value::Object(fields)) = data {
                for (key, value) in fields {
                    match value {
                        Value::String(s) => println!("  {}: {}", key, s),
                        other => println!("  {}: {}", key, other),
                    }
                }
            }
        }
    }
    Ok(())
}

/// Load configuration, turning a `ConfigError` into the operator diagnostic
pub fn load_config() -> anyhow::Result<AppConfig> {
    let _ = dotenvy::dotenv();
    AppConfig::from_env().map_err(|e: ConfigError| anyhow::anyhow!(e.diagnostic().join("\n")))
}
