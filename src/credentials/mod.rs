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

//! Operator credentials and their one-time validation.
//!
//! # Security Considerations
//! - The password lives in a [`SecretString`] and is zeroized on drop
//! - `Debug` output never reveals the password
//! - Credentials are not `Clone`; share them through an `Arc` instead
//! - Never log or print the password

mod prompt;
mod validator;

use secrecy::SecretString;
use std::fmt;
use thiserror::Error;

use crate::session::SessionError;

pub use prompt::{CredentialPrompt, TerminalPrompt};
pub use validator::{validate_credentials, ValidationPolicy};

/// Username/password pair used for every device in a run.
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The password. Call `expose_secret()` only at the point of use.
    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Reasons credential validation gives up.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("SSH timed out on {hostname}: {source}")]
    Timeout {
        hostname: String,
        #[source]
        source: SessionError,
    },

    #[error("unable to reach {hostname} while validating credentials: {source}")]
    Session {
        hostname: String,
        #[source]
        source: SessionError,
    },

    #[error("authentication failed on {hostname} after {attempts} attempt(s)")]
    TooManyAttempts { hostname: String, attempts: u32 },

    #[error("failed to read credentials: {0}")]
    Prompt(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("admin", SecretString::new("hunter2".into()));
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_accessors() {
        let creds = Credentials::new("admin", SecretString::new("hunter2".into()));
        assert_eq!(creds.username(), "admin");
        assert_eq!(creds.password().expose_secret(), "hunter2");
    }
}
