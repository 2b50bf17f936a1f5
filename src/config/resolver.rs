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

//! Resolution of the loaded file into runtime settings.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use super::types::{Config, DeviceOverride};
use super::utils::expand_path;
use crate::credentials::ValidationPolicy;
use crate::device::{DeviceSettings, DEFAULT_SSH_PORT};
use crate::poller::PollSettings;
use crate::session::SshSessionOptions;

impl DeviceOverride {
    /// Turn a fully merged record into device settings.
    ///
    /// `hostname` and `device_type` must be present; `port` falls back to
    /// 22 and `commands` to an empty list.
    pub fn resolve(self) -> Result<DeviceSettings> {
        let hostname = self
            .hostname
            .filter(|h| !h.trim().is_empty())
            .context("missing required field 'hostname'")?;
        let device_type = self
            .device_type
            .filter(|t| !t.trim().is_empty())
            .with_context(|| format!("missing required field 'device_type' for {hostname}"))?;

        Ok(DeviceSettings::new(
            hostname,
            device_type,
            self.port.unwrap_or(DEFAULT_SSH_PORT),
            self.commands.unwrap_or_default(),
        ))
    }
}

impl Config {
    /// Check values that cannot be expressed through the types alone.
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            anyhow::bail!("'threads' must be at least 1");
        }
        if self.device_list.is_empty() {
            anyhow::bail!("'device_list' must contain at least one device");
        }
        if self.connect_timeout == 0 {
            anyhow::bail!("'connect_timeout' must be at least 1 second");
        }
        if self.command_timeout == 0 {
            anyhow::bail!("'command_timeout' must be at least 1 second");
        }
        Ok(())
    }

    /// Merge `default` into every `device_list` entry, keeping list order.
    pub fn device_settings(&self) -> Result<Vec<DeviceSettings>> {
        self.device_list
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                entry
                    .overlay(&self.default)
                    .resolve()
                    .with_context(|| format!("Invalid entry at device_list[{index}]"))
            })
            .collect()
    }

    pub fn session_options(&self) -> SshSessionOptions {
        SshSessionOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout),
            command_timeout: Duration::from_secs(self.command_timeout),
            strict_host_key_checking: self.strict_host_key_checking,
        }
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy::with_max_attempts(self.max_auth_attempts)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings::new(self.max_iter, Duration::from_secs(self.sleep_time))
    }

    /// Output directory with `~` and environment variables expanded.
    pub fn resolved_output_dir(&self) -> PathBuf {
        expand_path(&self.output_dir)
    }
}
