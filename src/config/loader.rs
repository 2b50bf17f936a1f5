// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration loading and priority management.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::types::Config;
use super::utils::expand_tilde;

/// File name looked up in the working directory and the user config dir.
pub const DEFAULT_CONFIG_FILE: &str = "netwatch.yml";

impl Config {
    /// Load configuration from a file. A missing file is an error.
    pub async fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_tilde(path);

        let content = fs::read_to_string(&expanded_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to read configuration file at {}. Please check the path and file permissions.",
                    expanded_path.display()
                )
            })?;

        Self::from_yaml_str(&content).with_context(|| {
            format!(
                "Failed to parse YAML configuration file at {}",
                expanded_path.display()
            )
        })
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content).context(
            "Invalid YAML configuration.\nCommon issues:\n  - Incorrect indentation (use spaces, not tabs)\n  - Missing colons after keys\n  - Unquoted special characters",
        )?;
        Ok(config)
    }

    /// Load configuration with priority order:
    /// 1. Explicit path from the command line
    /// 2. `netwatch.yml` in the current directory
    /// 3. The user config directory (`~/.config/netwatch/netwatch.yml` on Linux)
    pub async fn load_with_priority(cli_config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = cli_config_path {
            tracing::debug!("Using explicitly specified config file: {:?}", path);
            return Self::load(path).await;
        }

        let candidates = Self::default_locations();
        for candidate in &candidates {
            if candidate.exists() {
                tracing::debug!("Found config file at {:?}", candidate);
                return Self::load(candidate).await;
            }
            tracing::debug!("No config file at {:?}", candidate);
        }

        anyhow::bail!(
            "No configuration file found. Looked in: {}",
            candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(DEFAULT_CONFIG_FILE)];
        if let Some(proj_dirs) = ProjectDirs::from("", "", "netwatch") {
            locations.push(proj_dirs.config_dir().join(DEFAULT_CONFIG_FILE));
        }
        locations
    }
}
