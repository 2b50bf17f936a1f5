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

//! One-shot credential validation.
//!
//! A mistyped password fanned out to every device at once turns into N
//! failed logins against the same account, which trips lockout policies on
//! AAA servers. Validation therefore runs sequentially against a single
//! device, and must finish before any batch is scheduled.

use super::{CredentialError, CredentialPrompt, Credentials};
use crate::device::DeviceSettings;
use crate::session::{DeviceSession, SessionConnector, SessionError};

/// Retry policy for authentication failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Maximum number of login attempts; `0` keeps prompting until the
    /// operator gets it right or interrupts.
    pub max_attempts: u32,
}

impl ValidationPolicy {
    pub fn unlimited() -> Self {
        Self { max_attempts: 0 }
    }

    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }
}

/// Prompt for credentials and prove them against `device`.
///
/// Only one login is ever outstanding: each attempt opens a session, closes
/// it without running anything, and returns before the next prompt.
///
/// Authentication failures re-prompt. A connect timeout is fatal, as is any
/// other failure to reach the device.
pub async fn validate_credentials<C, P>(
    connector: &C,
    prompt: &mut P,
    device: &DeviceSettings,
    policy: ValidationPolicy,
) -> Result<Credentials, CredentialError>
where
    C: SessionConnector,
    P: CredentialPrompt + ?Sized,
{
    let mut attempts: u32 = 0;

    loop {
        let username = prompt.read_username()?;
        let password = prompt.read_password()?;
        let credentials = Credentials::new(username, password);
        attempts += 1;

        tracing::debug!(
            "Validating credentials for {} against {} (attempt {})",
            credentials.username(),
            device.address(),
            attempts
        );

        match connector.open(device, &credentials).await {
            Ok(mut session) => {
                if let Err(e) = session.close().await {
                    tracing::debug!("Error closing validation session to {}: {}", device.hostname, e);
                }
                tracing::info!(
                    "Credentials for {} accepted by {}",
                    credentials.username(),
                    device.hostname
                );
                return Ok(credentials);
            }
            Err(SessionError::AuthFailure(message)) => {
                tracing::warn!("Authentication failed on {}: {}", device.hostname, message);
                if policy.exhausted(attempts) {
                    prompt.notify(&format!(
                        "authentication failed on {}, giving up after {} attempt(s)",
                        device.hostname, attempts
                    ));
                    return Err(CredentialError::TooManyAttempts {
                        hostname: device.hostname.clone(),
                        attempts,
                    });
                }
                prompt.notify(&format!(
                    "authentication failed on {} (CTRL + C to quit)",
                    device.hostname
                ));
            }
            Err(source @ SessionError::ConnectTimeout(_)) => {
                prompt.notify(&format!("SSH timed out on {}", device.hostname));
                return Err(CredentialError::Timeout {
                    hostname: device.hostname.clone(),
                    source,
                });
            }
            Err(source) => {
                return Err(CredentialError::Session {
                    hostname: device.hostname.clone(),
                    source,
                });
            }
        }
    }
}
