//! `-c key=value` overrides for values that would otherwise come from
//! `~/.rentlens/config.toml`.

use clap::ArgAction;
use clap::Parser;

#[derive(Parser, Debug, Default, Clone)]
pub struct CliConfigOverrides {
    /// Override a configuration value from `~/.rentlens/config.toml`. The
    /// `value` portion is parsed as TOML; if that fails the raw string is
    /// used as a literal.
    ///
    /// Examples:
    ///   - `-c page_size=50`
    ///   - `-c api_base=https://rentlens.example/api`
    #[arg(
        short = 'c',
        long = "config",
        value_name = "key=value",
        action = ArgAction::Append,
        global = true,
    )]
    pub raw_overrides: Vec<String>,
}

impl CliConfigOverrides {
    pub fn parse_overrides(&self) -> Result<Vec<(String, toml::Value)>, String> {
        self.raw_overrides
            .iter()
            .map(|s| {
                // Split on the first '=' only; values may contain it.
                let (key, value_str) = s
                    .split_once('=')
                    .ok_or_else(|| format!("Invalid override (missing '='): {s}"))?;
                let key = key.trim();
                let value_str = value_str.trim();
                if key.is_empty() {
                    return Err(format!("Empty key in override: {s}"));
                }
                Ok((key.to_string(), parse_toml_value(value_str)))
            })
            .collect()
    }
}

fn parse_toml_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("v = {raw}"))
        .ok()
        .and_then(|mut table| table.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}
