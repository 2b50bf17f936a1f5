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

use std::fmt;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Fully merged settings for one device.
///
/// Built once per run from the configuration and shared read-only by every
/// device task afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    pub hostname: String,
    pub device_type: String,
    pub port: u16,
    pub commands: Vec<String>,
}

impl DeviceSettings {
    pub fn new(
        hostname: impl Into<String>,
        device_type: impl Into<String>,
        port: u16,
        commands: Vec<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            device_type: device_type.into(),
            port,
            commands,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

impl fmt::Display for DeviceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address(), self.device_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address() {
        let device = DeviceSettings::new("10.0.0.1", "cisco_ios", 2222, vec![]);
        assert_eq!(device.address(), "10.0.0.1:2222");
    }

    #[test]
    fn test_display() {
        let device = DeviceSettings::new("core1", "juniper_junos", 22, vec!["show version".into()]);
        assert_eq!(device.to_string(), "core1:22 (juniper_junos)");
    }
}
