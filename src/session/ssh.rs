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

//! russh-backed session adapter.
//!
//! Devices are driven through an interactive shell on a PTY rather than
//! `exec` requests: most network operating systems either do not implement
//! `exec` or run each request in a context without the operator's CLI mode.
//! Prompt tracking lives in [`super::shell`].

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, Disconnect};
use secrecy::ExposeSecret;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use zeroize::Zeroizing;

use super::dialect::DeviceDialect;
use super::error::SessionError;
use super::handler::DeviceHandler;
use super::shell::PromptShell;
use super::{DeviceSession, SessionConnector};
use crate::credentials::Credentials;
use crate::device::DeviceSettings;

// Wide enough that devices do not wrap long `show` lines.
const PTY_COLUMNS: u32 = 511;
const PTY_ROWS: u32 = 24;
const PTY_TERM: &str = "vt100";

/// Timeouts and policy applied to every session opened by [`SshConnector`].
#[derive(Debug, Clone, Copy)]
pub struct SshSessionOptions {
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub strict_host_key_checking: bool,
}

impl Default for SshSessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(60),
            strict_host_key_checking: false,
        }
    }
}

/// Production [`SessionConnector`] that speaks SSH via russh.
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    options: SshSessionOptions,
}

impl SshConnector {
    pub fn new(options: SshSessionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SshSessionOptions {
        &self.options
    }

    async fn connect_and_authenticate(
        &self,
        device: &DeviceSettings,
        credentials: &Credentials,
    ) -> Result<Handle<DeviceHandler>, SessionError> {
        let config = Arc::new(client::Config::default());
        let handler = DeviceHandler::new(
            device.hostname.clone(),
            device.port,
            self.options.strict_host_key_checking,
        );

        let mut handle = client::connect(config, (device.hostname.as_str(), device.port), handler)
            .await
            .map_err(SessionError::from)?;

        let password = Zeroizing::new(credentials.password().expose_secret().to_string());
        let auth = handle
            .authenticate_password(credentials.username(), password.as_str())
            .await;

        let rejected = match auth {
            Ok(result) if result.success() => return Ok(handle),
            Ok(_) => SessionError::auth(format!(
                "Authentication to device {} failed.",
                device.address()
            )),
            Err(e) => SessionError::from(e),
        };
        disconnect_quietly(&handle, &device.hostname).await;
        Err(rejected)
    }

    /// Open the PTY shell on an authenticated connection and learn its prompt.
    async fn start_shell(
        &self,
        handle: &Handle<DeviceHandler>,
        device: &DeviceSettings,
    ) -> Result<PromptShell<Channel<Msg>>, SessionError> {
        let channel = handle
            .channel_open_session()
            .await
            .map_err(SessionError::from)?;
        channel
            .request_pty(false, PTY_TERM, PTY_COLUMNS, PTY_ROWS, 0, 0, &[])
            .await
            .map_err(SessionError::from)?;
        channel
            .request_shell(false)
            .await
            .map_err(SessionError::from)?;

        let mut shell = PromptShell::new(
            channel,
            DeviceDialect::from_device_type(&device.device_type),
            self.options.command_timeout,
        );

        let connect_timeout = self.options.connect_timeout;
        match timeout(connect_timeout, shell.prepare()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SessionError::ConnectTimeout(format!(
                    "device {} never presented a CLI prompt within {} seconds",
                    device.address(),
                    connect_timeout.as_secs()
                )))
            }
        }
        Ok(shell)
    }
}

#[async_trait]
impl SessionConnector for SshConnector {
    type Session = SshSession;

    async fn open(
        &self,
        device: &DeviceSettings,
        credentials: &Credentials,
    ) -> Result<SshSession, SessionError> {
        let connect_timeout = self.options.connect_timeout;
        tracing::debug!(
            "Connecting to {} as {} (device_type={})",
            device.address(),
            credentials.username(),
            device.device_type
        );

        let handle = match timeout(
            connect_timeout,
            self.connect_and_authenticate(device, credentials),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(SessionError::ConnectTimeout(format!(
                    "TCP connection to device failed or timed out after {} seconds. Device: {}",
                    connect_timeout.as_secs(),
                    device.address()
                )))
            }
        };

        let shell = disconnect_on_error(self.start_shell(&handle, device).await, || {
            disconnect_quietly(&handle, &device.hostname)
        })
        .await?;

        tracing::debug!(
            "Session to {} ready (dialect={}, prompt={:?})",
            device.address(),
            shell.dialect(),
            shell.prompt()
        );
        Ok(SshSession {
            hostname: device.hostname.clone(),
            handle,
            shell,
        })
    }
}

/// Run `disconnect` before handing back an error, so a failed setup never
/// leaves a half-open session occupying a VTY line on the device.
async fn disconnect_on_error<T, F, Fut>(
    result: Result<T, SessionError>,
    disconnect: F,
) -> Result<T, SessionError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    if result.is_err() {
        disconnect().await;
    }
    result
}

async fn disconnect_quietly(handle: &Handle<DeviceHandler>, hostname: &str) {
    if let Err(e) = handle
        .disconnect(Disconnect::ByApplication, "", "English")
        .await
    {
        tracing::debug!("Disconnect from {} failed: {}", hostname, e);
    }
}

/// An interactive shell on one device.
pub struct SshSession {
    hostname: String,
    handle: Handle<DeviceHandler>,
    shell: PromptShell<Channel<Msg>>,
}

impl SshSession {
    /// The prompt detected when the session was opened.
    pub fn prompt(&self) -> &str {
        self.shell.prompt()
    }
}

#[async_trait]
impl DeviceSession for SshSession {
    async fn send_command(&mut self, command: &str) -> Result<String, SessionError> {
        self.shell.send_command(command).await.map_err(|e| {
            tracing::debug!("Command {:?} on {} failed: {}", command, self.hostname, e);
            e
        })
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        // Best effort: some devices drop the channel as soon as they see `exit`.
        let _ = self.shell.write_line("exit").await;
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(SessionError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_disconnect_runs_only_on_error() {
        let disconnects = AtomicUsize::new(0);
        let counter = &disconnects;
        let count = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
        };

        let ok = disconnect_on_error(Ok::<_, SessionError>("router1#"), count).await;
        assert_eq!(ok.unwrap(), "router1#");
        assert_eq!(disconnects.load(Ordering::SeqCst), 0);

        let failed = disconnect_on_error(
            Err::<(), _>(SessionError::connection("PTY request refused")),
            count,
        )
        .await;
        assert_eq!(
            failed.unwrap_err(),
            SessionError::connection("PTY request refused")
        );
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_options() {
        let options = SshSessionOptions::default();
        assert_eq!(options.connect_timeout, Duration::from_secs(30));
        assert_eq!(options.command_timeout, Duration::from_secs(60));
        assert!(!options.strict_host_key_checking);
    }
}
