//! `METHOD /path {json}` call lines

use anyhow::{Context, Result, anyhow, bail};
use busrpc_core::Method;
use busrpc_transport::Parameters;
use std::str::FromStr;

/// One call read from the command line or stdin
#[derive(Debug, Clone, PartialEq)]
pub struct CallLine {
    pub method: Method,
    pub path: String,
    pub parameters: Parameters,
}

impl FromStr for CallLine {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (method, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        if method.is_empty() {
            bail!("expected METHOD /path [json]");
        }
        let method: Method = method.parse()?;

        let rest = rest.trim_start();
        let (path, params) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        if !path.starts_with('/') {
            bail!("path must start with '/': {:?}", path);
        }

        let params = params.trim();
        let parameters = if params.is_empty() {
            Parameters::new()
        } else {
            match serde_json::from_str(params).context("parameters are not valid JSON")? {
                serde_json::Value::Object(map) => map,
                other => return Err(anyhow!("parameters must be a JSON object, got {}", other)),
            }
        };

        Ok(Self {
            method,
            path: path.to_string(),
            parameters,
        })
    }
}

/// Blank lines and `#` comments carry no call
pub fn is_blank(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#')
}

#[cfg(test)]
#[path = "line/line_tests.rs"]
mod line_tests;
