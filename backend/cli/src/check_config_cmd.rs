//! `photodrop check-config`: effective config with secrets masked, then the
//! validation report. Fails when the report has errors.

use std::path::Path;

use anyhow::{bail, Context, Result};
use photodrop_config::{redact, validate, PhotodropConfig};

pub fn run(config: &PhotodropConfig, path: &Path) -> Result<()> {
    println!("\n🔍 Checking {}\n", path.display());

    let value = serde_json::to_value(config).context("Failed to serialize config")?;
    let yaml = serde_yaml::to_string(&redact(&value)).context("Failed to render config")?;
    println!("{yaml}");

    let report = validate(config);
    for warning in &report.warnings {
        println!("  🟡 {}: {}", warning.path, warning.message);
    }
    for err in &report.errors {
        println!("  🔴 {}: {}", err.path, err.message);
    }

    println!();
    if report.is_valid() {
        println!("✅ Config is valid.");
        Ok(())
    } else {
        println!("❌ Config has errors. Please fix them above.");
        bail!("{} config error(s)", report.errors.len())
    }
}
