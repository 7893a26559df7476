//! Configuration loading and validation

use anyhow::{Context, Result};
use busrpc_core::RpcConfig;
use std::path::Path;

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "busrpc.toml";

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub instances: Option<usize>,
    pub call_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut RpcConfig) {
        if let Some(instances) = self.instances {
            config.instances = instances;
        }
        if let Some(timeout) = self.call_timeout_ms {
            config.call_timeout_ms = timeout;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
    }
}

/// Load the configuration, apply overrides and validate the result
///
/// An explicit path must exist. Without one, `busrpc.toml` is used when it
/// is present and the defaults otherwise.
pub fn load(path: Option<&str>, overrides: &Overrides) -> Result<RpcConfig> {
    load_from(path, Path::new(DEFAULT_CONFIG_FILE), overrides)
}

fn load_from(path: Option<&str>, fallback: &Path, overrides: &Overrides) -> Result<RpcConfig> {
    let mut config = match path {
        Some(path) => RpcConfig::load(path)?,
        None if fallback.exists() => RpcConfig::load(fallback)?,
        None => RpcConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Check command: validate and summarize the configuration
pub fn check(path: Option<&str>, overrides: &Overrides, print: bool) -> Result<()> {
    let shown = path.unwrap_or(DEFAULT_CONFIG_FILE);
    println!("Checking configuration: {}", shown);

    let config = load(path, overrides)?;

    println!("✓ Request queue: {}", config.request_queue);
    println!("✓ Instances: {}", config.instances);
    println!("✓ Call timeout: {}ms", config.call_timeout_ms);
    println!(
        "✓ Dead-letter queue: {}",
        config.dead_letter_queue.as_deref().unwrap_or("(none)")
    );
    if print {
        println!("\n{}", toml::to_string_pretty(&config)?);
    }
    println!("\nConfiguration is valid!");

    Ok(())
}
