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

//! Configuration type definitions.

use serde::Deserialize;

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub device_list: Vec<DeviceOverride>,

    /// Settings shared by every device; per-device values win.
    #[serde(default)]
    pub default: DeviceOverride,

    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Number of iterations; `0` loops until interrupted.
    #[serde(default = "default_max_iter")]
    pub max_iter: u64,

    /// Seconds to pause between iterations.
    #[serde(default = "default_sleep_time")]
    pub sleep_time: u64,

    #[serde(default)]
    pub file_output: bool,

    #[serde(default = "default_true")]
    pub print_output: bool,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,

    /// Login attempts allowed during validation; `0` means no limit.
    #[serde(default)]
    pub max_auth_attempts: u32,

    #[serde(default)]
    pub strict_host_key_checking: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_list: Vec::new(),
            default: DeviceOverride::default(),
            threads: default_threads(),
            max_iter: default_max_iter(),
            sleep_time: default_sleep_time(),
            file_output: false,
            print_output: true,
            output_dir: default_output_dir(),
            connect_timeout: default_connect_timeout(),
            command_timeout: default_command_timeout(),
            max_auth_attempts: 0,
            strict_host_key_checking: false,
        }
    }
}

/// Partial device settings as written in the file.
///
/// Appears both as the `default` block and as each `device_list` entry.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DeviceOverride {
    #[serde(default)]
    pub hostname: Option<String>,

    #[serde(default)]
    pub device_type: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub commands: Option<Vec<String>>,
}

impl DeviceOverride {
    /// Layer `self` over `base`: every field set here replaces the base value.
    pub fn overlay(&self, base: &DeviceOverride) -> DeviceOverride {
        DeviceOverride {
            hostname: self.hostname.clone().or_else(|| base.hostname.clone()),
            device_type: self
                .device_type
                .clone()
                .or_else(|| base.device_type.clone()),
            port: self.port.or(base.port),
            commands: self.commands.clone().or_else(|| base.commands.clone()),
        }
    }
}

fn default_threads() -> usize {
    4
}

fn default_max_iter() -> u64 {
    1
}

fn default_sleep_time() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_command_timeout() -> u64 {
    60
}
