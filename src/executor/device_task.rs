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

//! Single-device task: open a session, run every command, record everything.

use chrono::Local;

use super::result_types::{
    CommandResult, DeviceResult, COMMAND_TIMED_OUT, POST_CONNECT_FAILURE,
};
use crate::credentials::Credentials;
use crate::device::DeviceSettings;
use crate::session::{DeviceSession, SessionConnector, SessionError};

/// Run `device`'s command list and capture one result per command.
///
/// This never fails. A session that cannot be opened yields a result where
/// every slot carries the connection diagnostic; a command that fails
/// records its diagnostic and the remaining commands still run.
pub async fn execute_device<C>(
    connector: &C,
    device: &DeviceSettings,
    credentials: &Credentials,
) -> DeviceResult
where
    C: SessionConnector,
{
    let mut session = match connector.open(device, credentials).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!("Failed to connect to {}: {}", device.address(), e);
            return DeviceResult::unreachable(device, &e, Local::now());
        }
    };

    let mut entries = Vec::with_capacity(device.commands.len());
    for command in &device.commands {
        let text = match session.send_command(command).await {
            Ok(output) => output,
            Err(SessionError::CommandTimeout(secs)) => {
                tracing::warn!(
                    "Command '{}' on {} timed out after {}s",
                    command,
                    device.hostname,
                    secs
                );
                COMMAND_TIMED_OUT.to_string()
            }
            Err(e) => {
                tracing::warn!("Command '{}' on {} failed: {}", command, device.hostname, e);
                format!("{POST_CONNECT_FAILURE}: {e}")
            }
        };
        entries.push((command.clone(), CommandResult::now(text)));
    }

    if let Err(e) = session.close().await {
        tracing::debug!("Error closing session to {}: {}", device.hostname, e);
    }

    tracing::debug!(
        "Finished {} command(s) on {}",
        entries.len(),
        device.hostname
    );
    DeviceResult::from_command_results(device.hostname.clone(), entries)
}
