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

//! Remote session abstraction.
//!
//! The polling engine never talks to russh directly. It consumes the
//! [`SessionConnector`] / [`DeviceSession`] pair, which lets tests drive the
//! scheduler and the credential validator with in-memory sessions.

pub mod dialect;
pub mod error;
mod handler;
mod shell;
pub mod ssh;

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::device::DeviceSettings;

pub use dialect::DeviceDialect;
pub use error::SessionError;
pub use ssh::{SshConnector, SshSession, SshSessionOptions};

/// Opens authenticated sessions to devices.
#[async_trait]
pub trait SessionConnector: Send + Sync + 'static {
    type Session: DeviceSession;

    /// Connect and authenticate to `device` using `credentials`.
    ///
    /// Authentication rejections must be reported as
    /// [`SessionError::AuthFailure`] and connect timeouts as
    /// [`SessionError::ConnectTimeout`]; the credential validator branches on
    /// those two kinds.
    async fn open(
        &self,
        device: &DeviceSettings,
        credentials: &Credentials,
    ) -> Result<Self::Session, SessionError>;
}

/// An open command channel to one device.
#[async_trait]
pub trait DeviceSession: Send {
    /// Send one command and return its textual output.
    async fn send_command(&mut self, command: &str) -> Result<String, SessionError>;

    /// Tear the session down.
    async fn close(&mut self) -> Result<(), SessionError>;
}
