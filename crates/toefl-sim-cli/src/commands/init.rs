//! The `toefl-sim init` command.

use std::path::Path;

use anyhow::Result;

use toefl_sim_providers::config::CONFIG_FILE_NAME;

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE_NAME).exists() {
        println!("{CONFIG_FILE_NAME} already exists, skipping.");
        return Ok(());
    }
    std::fs::write(CONFIG_FILE_NAME, SAMPLE_CONFIG)?;
    println!("Created {CONFIG_FILE_NAME}");

    println!("\nNext steps:");
    println!("  1. Export GEMINI_API_KEY (or put it in a .env file)");
    println!("  2. Run: toefl-sim check");
    println!("  3. Run: toefl-sim reading");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# toefl-sim configuration

# "gemini" calls the API; "mock" serves canned offline material.
provider = "gemini"
model = "gemini-2.0-flash"
max_tokens = 2000

# Retries on rate limits and transient errors (0 = off).
max_retries = 0
retry_delay_ms = 1000

[gemini]
api_key = "${GEMINI_API_KEY}"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use toefl_sim_providers::ToeflSimConfig;

    #[test]
    fn sample_config_parses() {
        let config: ToeflSimConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.gemini.api_key, "${GEMINI_API_KEY}");
    }
}
