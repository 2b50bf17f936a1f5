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

use thiserror::Error;

/// Error kinds surfaced by a session adapter.
///
/// The `Display` output is only the carried message, so a result line reads
/// `Exception occured before SSH connection: <message>` without any Rust
/// type noise.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The device rejected the username/password.
    #[error("{0}")]
    AuthFailure(String),

    /// TCP connect or SSH handshake did not finish within the connect timeout.
    #[error("{0}")]
    ConnectTimeout(String),

    /// Any other failure while establishing the session.
    #[error("{0}")]
    Connection(String),

    /// The device did not return to its prompt within the command timeout.
    #[error("command timed out after {0} seconds")]
    CommandTimeout(u64),

    /// Any other failure while running a command on an open session.
    #[error("{0}")]
    Command(String),
}

impl SessionError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::AuthFailure(message.into())
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::Command(message.into())
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailure(_))
    }

    pub fn is_connect_timeout(&self) -> bool {
        matches!(self, Self::ConnectTimeout(_))
    }

    pub fn is_command_timeout(&self) -> bool {
        matches!(self, Self::CommandTimeout(_))
    }
}

impl From<russh::Error> for SessionError {
    fn from(err: russh::Error) -> Self {
        match err {
            russh::Error::ConnectionTimeout => {
                Self::ConnectTimeout("SSH connection timed out".to_string())
            }
            russh::Error::IO(ref io_err) if io_err.kind() == std::io::ErrorKind::TimedOut => {
                Self::ConnectTimeout(format!("SSH connection timed out: {io_err}"))
            }
            other => Self::Connection(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_bare_message() {
        assert_eq!(SessionError::auth("auth failed").to_string(), "auth failed");
        assert_eq!(
            SessionError::connection("connection refused").to_string(),
            "connection refused"
        );
        assert_eq!(
            SessionError::CommandTimeout(30).to_string(),
            "command timed out after 30 seconds"
        );
    }

    #[test]
    fn test_kind_helpers() {
        assert!(SessionError::auth("x").is_auth_failure());
        assert!(!SessionError::connection("x").is_auth_failure());
        assert!(SessionError::ConnectTimeout("x".into()).is_connect_timeout());
        assert!(SessionError::CommandTimeout(5).is_command_timeout());
        assert!(!SessionError::command("x").is_command_timeout());
    }

    #[test]
    fn test_russh_timeout_maps_to_connect_timeout() {
        let err: SessionError = russh::Error::ConnectionTimeout.into();
        assert!(err.is_connect_timeout());

        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline");
        let err: SessionError = russh::Error::IO(io).into();
        assert!(err.is_connect_timeout());

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: SessionError = russh::Error::IO(io).into();
        assert!(matches!(err, SessionError::Connection(_)));
    }
}
