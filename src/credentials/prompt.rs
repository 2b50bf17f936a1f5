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

use secrecy::SecretString;
use std::io::{self, BufRead, Write};
use zeroize::Zeroizing;

/// Source of operator credentials.
///
/// The terminal implementation is used by the binary; tests inject canned
/// answers so the validator can be exercised without a TTY.
pub trait CredentialPrompt {
    fn read_username(&mut self) -> io::Result<String>;

    fn read_password(&mut self) -> io::Result<SecretString>;

    /// Show a diagnostic to the operator between attempts.
    fn notify(&mut self, message: &str);
}

/// Interactive prompt on the controlling terminal.
///
/// The username is read in plain text from stdin and the password with
/// echo disabled.
#[derive(Debug, Default)]
pub struct TerminalPrompt {
    preset_username: Option<String>,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `username` for the first attempt instead of asking for it.
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.preset_username = username.filter(|u| !u.trim().is_empty());
        self
    }
}

impl CredentialPrompt for TerminalPrompt {
    fn read_username(&mut self) -> io::Result<String> {
        if let Some(username) = self.preset_username.take() {
            return Ok(username);
        }

        print!("Username: ");
        io::stdout().flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stdin closed while reading username",
            ));
        }
        Ok(line.trim().to_string())
    }

    fn read_password(&mut self) -> io::Result<SecretString> {
        let password = Zeroizing::new(rpassword::prompt_password("Password: ")?);
        Ok(SecretString::new(password.as_str().into()))
    }

    fn notify(&mut self, message: &str) {
        println!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_username_used_once() {
        let mut prompt = TerminalPrompt::new().with_username(Some("netops".to_string()));
        assert_eq!(prompt.preset_username.as_deref(), Some("netops"));
        assert_eq!(prompt.read_username().unwrap(), "netops");
        assert!(prompt.preset_username.is_none());
    }

    #[test]
    fn test_blank_preset_is_ignored() {
        let prompt = TerminalPrompt::new().with_username(Some("   ".to_string()));
        assert!(prompt.preset_username.is_none());
    }
}
