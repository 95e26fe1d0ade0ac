use credit_risk_core::RiskConfig;

use super::file;

/// Risk constants: defaults, or the `--config` file (YAML when the
/// extension says so, JSON otherwise). Missing keys keep their defaults.
pub fn load_config(path: Option<&str>) -> Result<RiskConfig, Box<dyn std::error::Error>> {
    let config: RiskConfig = match path {
        None => RiskConfig::default(),
        Some(p) if is_yaml(p) => file::read_yaml(p)?,
        Some(p) => file::read_json(p)?,
    };
    config.validate()?;
    tracing::debug!(path = ?path, "risk configuration loaded");
    Ok(config)
}

fn is_yaml(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.ends_with(".yaml") || lower.ends_with(".yml")
}
