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

//! Result types produced by device tasks.

use chrono::{DateTime, Local};
use std::fmt;

use crate::device::DeviceSettings;

/// Prefix for every slot of a device whose session could not be opened.
pub const PRE_CONNECT_FAILURE: &str = "Exception occured before SSH connection";

/// Prefix for a command that failed on an open session.
pub const POST_CONNECT_FAILURE: &str = "Exception after SSH connection";

/// Marker recorded when a command does not return to the prompt in time.
pub const COMMAND_TIMED_OUT: &str = "COMMAND TIMED OUT";

pub type Timestamp = DateTime<Local>;

/// Outcome of one command attempt. Failures are text like any other output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub text: String,
    pub timestamp: Timestamp,
}

impl CommandResult {
    pub fn new(text: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            text: text.into(),
            timestamp,
        }
    }

    /// Record `text` stamped with the current local time.
    pub fn now(text: impl Into<String>) -> Self {
        Self::new(text, Local::now())
    }
}

/// Everything one device produced in one iteration.
///
/// `commands`, `results` and `timestamps` always have the same length, and
/// index `i` in each refers to the same command attempt. The type has no
/// mutating API; the only constructors build the three sequences together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceResult {
    hostname: String,
    commands: Vec<String>,
    results: Vec<String>,
    timestamps: Vec<Timestamp>,
    reachable: bool,
}

impl DeviceResult {
    /// Build a result for a device whose session was established.
    pub fn from_command_results<I>(hostname: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, CommandResult)>,
    {
        let mut commands = Vec::new();
        let mut results = Vec::new();
        let mut timestamps = Vec::new();

        for (command, outcome) in entries {
            commands.push(command);
            results.push(outcome.text);
            timestamps.push(outcome.timestamp);
        }

        Self {
            hostname: hostname.into(),
            commands,
            results,
            timestamps,
            reachable: true,
        }
    }

    /// Build a result for a device that never got a session.
    ///
    /// Every command slot receives the same diagnostic and the same
    /// timestamp, so the output keeps its full shape.
    pub fn unreachable(
        device: &DeviceSettings,
        reason: &dyn fmt::Display,
        failed_at: Timestamp,
    ) -> Self {
        let text = format!("{PRE_CONNECT_FAILURE}: {reason}");
        let count = device.commands.len();

        Self {
            hostname: device.hostname.clone(),
            commands: device.commands.clone(),
            results: vec![text; count],
            timestamps: vec![failed_at; count],
            reachable: false,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn results(&self) -> &[String] {
        &self.results
    }

    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Whether a session to the device was established.
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate over `(command, result, timestamp)` triples in send order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, &Timestamp)> + '_ {
        self.commands
            .iter()
            .zip(&self.results)
            .zip(&self.timestamps)
            .map(|((command, result), timestamp)| (command.as_str(), result.as_str(), timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(commands: &[&str]) -> DeviceSettings {
        DeviceSettings::new(
            "10.0.0.3",
            "cisco_ios",
            22,
            commands.iter().map(|c| c.to_string()).collect(),
        )
    }

    #[test]
    fn test_unreachable_fills_every_slot() {
        let at = Local::now();
        let result = DeviceResult::unreachable(
            &device(&["show version", "show clock"]),
            &"auth failed",
            at,
        );

        assert_eq!(result.hostname(), "10.0.0.3");
        assert_eq!(result.commands().len(), 2);
        assert_eq!(
            result.results(),
            &[
                "Exception occured before SSH connection: auth failed".to_string(),
                "Exception occured before SSH connection: auth failed".to_string(),
            ]
        );
        assert_eq!(result.timestamps(), &[at, at]);
        assert!(!result.is_reachable());
    }

    #[test]
    fn test_unreachable_without_commands() {
        let result = DeviceResult::unreachable(&device(&[]), &"refused", Local::now());
        assert!(result.is_empty());
        assert_eq!(result.timestamps().len(), 0);
    }

    #[test]
    fn test_from_command_results_keeps_order() {
        let first = CommandResult::now("IOS 15.2");
        let second = CommandResult::now(COMMAND_TIMED_OUT);
        let result = DeviceResult::from_command_results(
            "core1",
            vec![
                ("show version".to_string(), first.clone()),
                ("show tech".to_string(), second.clone()),
            ],
        );

        assert!(result.is_reachable());
        assert_eq!(result.len(), 2);
        let entries: Vec<_> = result.entries().collect();
        assert_eq!(entries[0], ("show version", "IOS 15.2", &first.timestamp));
        assert_eq!(entries[1], ("show tech", COMMAND_TIMED_OUT, &second.timestamp));
    }
}
