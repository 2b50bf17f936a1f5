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

use russh::client::Handler;

/// russh client handler that decides whether to trust a device host key.
#[derive(Debug, Clone)]
pub(crate) struct DeviceHandler {
    hostname: String,
    port: u16,
    strict_host_key_checking: bool,
}

impl DeviceHandler {
    pub(crate) fn new(hostname: String, port: u16, strict_host_key_checking: bool) -> Self {
        Self {
            hostname,
            port,
            strict_host_key_checking,
        }
    }
}

impl Handler for DeviceHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        // Host key checking is opt-in.
        if !self.strict_host_key_checking {
            return Ok(true);
        }

        match russh::keys::check_known_hosts(&self.hostname, self.port, server_public_key) {
            Ok(true) => Ok(true),
            Ok(false) => {
                tracing::warn!(
                    "Host key for {}:{} not found in known_hosts",
                    self.hostname,
                    self.port
                );
                Ok(false)
            }
            Err(e) => {
                tracing::warn!(
                    "Host key verification failed for {}:{}: {}",
                    self.hostname,
                    self.port,
                    e
                );
                Ok(false)
            }
        }
    }
}
