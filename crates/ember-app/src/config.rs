// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogCfg {
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppInfoCfg {
    /// Application name reported to the driver.
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowCfg {
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppCfg {
    pub log: LogCfg,
    pub app: AppInfoCfg,
    pub window: WindowCfg,
}

impl Default for LogCfg {
    fn default() -> Self {
        Self {
            filter: "info,vulkan=debug".into(),
        }
    }
}

impl Default for AppInfoCfg {
    fn default() -> Self {
        Self {
            name: "Hello Triangle".into(),
        }
    }
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            title: "Vulkan".into(),
        }
    }
}

impl AppCfg {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// A missing file yields the defaults; an unreadable or malformed one is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => {
                Self::parse(&text).with_context(|| format!("parsing {}", path.display()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }
}
