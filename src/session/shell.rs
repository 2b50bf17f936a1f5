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

//! Prompt-synchronised command I/O over an interactive shell.
//!
//! Every command is written to the shell and its output is read until the
//! device prompt returns. After a command times out the shell is resynchronised
//! before anything else is sent, so late output can never land in the next
//! command's result.

use async_trait::async_trait;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use std::time::Duration;
use tokio::time::timeout;

use super::dialect::DeviceDialect;
use super::error::SessionError;

/// Initial capacity for the per-command read buffer.
const READ_BUFFER_SIZE: usize = 8192;

/// Upper bound for getting the prompt back after a command timeout.
const RESYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// Silence that marks the end of trailing output while resynchronising.
const QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Byte-level access to a shell channel.
#[async_trait]
pub(crate) trait ShellIo: Send {
    async fn write(&mut self, data: &[u8]) -> Result<(), SessionError>;

    /// Next chunk of output, or `None` once the channel is closed.
    async fn read(&mut self) -> Option<Vec<u8>>;
}

#[async_trait]
impl ShellIo for Channel<Msg> {
    async fn write(&mut self, data: &[u8]) -> Result<(), SessionError> {
        self.data(data)
            .await
            .map_err(|e| SessionError::command(format!("failed to write to channel: {e}")))
    }

    async fn read(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.wait().await {
                Some(ChannelMsg::Data { ref data }) => return Some(data.to_vec()),
                Some(ChannelMsg::ExtendedData { ref data, .. }) => return Some(data.to_vec()),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => return None,
                Some(_) => continue,
            }
        }
    }
}

pub(crate) struct PromptShell<T> {
    io: T,
    dialect: DeviceDialect,
    prompt: String,
    command_timeout: Duration,
    /// Set when the prompt could not be recovered after a timeout.
    desynchronized: bool,
}

impl<T: ShellIo> PromptShell<T> {
    pub(crate) fn new(io: T, dialect: DeviceDialect, command_timeout: Duration) -> Self {
        Self {
            io,
            dialect,
            prompt: String::new(),
            command_timeout,
            desynchronized: false,
        }
    }

    pub(crate) fn prompt(&self) -> &str {
        &self.prompt
    }

    pub(crate) fn dialect(&self) -> DeviceDialect {
        self.dialect
    }

    /// Learn the base prompt and switch off paging.
    pub(crate) async fn prepare(&mut self) -> Result<(), SessionError> {
        self.write_line("").await?;
        let banner = self.read_until_prompt().await?;
        self.prompt = self
            .dialect
            .find_prompt(&banner)
            .ok_or_else(|| SessionError::connection("unable to detect device prompt"))?;

        if let Some(paging) = self.dialect.paging_command() {
            self.write_line(paging).await?;
            self.read_until_prompt().await?;
        }
        Ok(())
    }

    pub(crate) async fn send_command(&mut self, command: &str) -> Result<String, SessionError> {
        if self.desynchronized {
            return Err(SessionError::command(
                "not sent: device prompt was lost after an earlier command timed out",
            ));
        }

        self.write_line(command).await?;

        let limit = self.command_timeout;
        match timeout(limit, self.read_until_prompt()).await {
            Ok(raw) => Ok(self.dialect.clean_output(&raw?, command, &self.prompt)),
            Err(_) => {
                self.resync().await;
                Err(SessionError::CommandTimeout(limit.as_secs()))
            }
        }
    }

    pub(crate) async fn write_line(&mut self, line: &str) -> Result<(), SessionError> {
        let payload = format!("{line}\n");
        self.io.write(payload.as_bytes()).await
    }

    /// Discard output until the prompt is back and the device goes quiet.
    async fn resync(&mut self) {
        let recovered = timeout(RESYNC_TIMEOUT, async {
            self.write_line("").await?;
            self.read_until_prompt().await?;
            self.drain_quiet().await
        })
        .await;

        match recovered {
            Ok(Ok(())) => tracing::debug!("Prompt {:?} recovered after command timeout", self.prompt),
            Ok(Err(e)) => {
                tracing::warn!("Failed to recover prompt {:?}: {}", self.prompt, e);
                self.desynchronized = true;
            }
            Err(_) => {
                tracing::warn!(
                    "Prompt {:?} did not return within {}s after a command timeout",
                    self.prompt,
                    RESYNC_TIMEOUT.as_secs()
                );
                self.desynchronized = true;
            }
        }
    }

    async fn drain_quiet(&mut self) -> Result<(), SessionError> {
        loop {
            match timeout(QUIET_PERIOD, self.io.read()).await {
                Ok(Some(_)) => continue,
                Ok(None) => return Err(SessionError::command("channel closed while resynchronising")),
                Err(_) => return Ok(()),
            }
        }
    }

    async fn read_until_prompt(&mut self) -> Result<String, SessionError> {
        let mut buffer: Vec<u8> = Vec::with_capacity(READ_BUFFER_SIZE);

        loop {
            let chunk = self
                .io
                .read()
                .await
                .ok_or_else(|| SessionError::command("channel closed before the prompt returned"))?;
            buffer.extend_from_slice(&chunk);

            let text = String::from_utf8_lossy(&buffer);
            if self.dialect.match_prompt(&text, &self.prompt).is_some() {
                return Ok(text.into_owned());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use tokio::time::Instant;

    /// In-memory shell that answers each written line with timed chunks.
    /// Chunks are delivered in write order, like a real terminal.
    #[derive(Default)]
    struct ScriptedShell {
        replies: HashMap<String, Vec<(Duration, &'static str)>>,
        pending: VecDeque<(Instant, Vec<u8>)>,
        hang_on: Option<&'static str>,
        hung: bool,
        writes: Vec<String>,
    }

    impl ScriptedShell {
        fn reply(mut self, line: &str, chunks: &[(u64, &'static str)]) -> Self {
            self.replies.insert(
                line.to_string(),
                chunks
                    .iter()
                    .map(|(secs, text)| (Duration::from_secs(*secs), *text))
                    .collect(),
            );
            self
        }

        /// Stop answering anything once `line` is written.
        fn hang_on(mut self, line: &'static str) -> Self {
            self.hang_on = Some(line);
            self
        }
    }

    #[async_trait]
    impl ShellIo for ScriptedShell {
        async fn write(&mut self, data: &[u8]) -> Result<(), SessionError> {
            let line = String::from_utf8_lossy(data).trim_end_matches('\n').to_string();
            if self.hang_on == Some(line.as_str()) {
                self.hung = true;
            }
            if !self.hung {
                let now = Instant::now();
                let mut last = self.pending.back().map(|(at, _)| *at).unwrap_or(now);
                for (delay, text) in self.replies.get(&line).cloned().unwrap_or_default() {
                    let at = (now + delay).max(last);
                    last = at;
                    self.pending.push_back((at, text.as_bytes().to_vec()));
                }
            }
            self.writes.push(line);
            Ok(())
        }

        async fn read(&mut self) -> Option<Vec<u8>> {
            let at = match self.pending.front() {
                Some((at, _)) => *at,
                None => return std::future::pending().await,
            };
            tokio::time::sleep_until(at).await;
            self.pending.pop_front().map(|(_, data)| data)
        }
    }

    fn ios_shell() -> ScriptedShell {
        ScriptedShell::default()
            .reply("", &[(0, "\r\nrouter1#")])
            .reply("terminal length 0", &[(0, "terminal length 0\r\nrouter1#")])
            .reply("show clock", &[(0, "show clock\r\n*10:00:00 UTC\r\nrouter1#")])
    }

    async fn prepared(io: ScriptedShell, dialect: DeviceDialect) -> PromptShell<ScriptedShell> {
        let mut shell = PromptShell::new(io, dialect, Duration::from_secs(10));
        shell.prepare().await.unwrap();
        shell
    }

    #[tokio::test(start_paused = true)]
    async fn test_prepare_learns_prompt_and_disables_paging() {
        let shell = prepared(ios_shell(), DeviceDialect::CiscoIos).await;
        assert_eq!(shell.prompt(), "router1#");
        assert_eq!(shell.dialect(), DeviceDialect::CiscoIos);
        assert_eq!(shell.io.writes, vec!["", "terminal length 0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_output_stays_with_timed_out_command() {
        let io = ios_shell().reply(
            "show slow",
            &[(0, "show slow\r\n"), (12, "slow output\r\nrouter1#")],
        );
        let mut shell = prepared(io, DeviceDialect::CiscoIos).await;

        let err = shell.send_command("show slow").await.unwrap_err();
        assert_eq!(err, SessionError::CommandTimeout(10));

        let output = shell.send_command("show clock").await.unwrap();
        assert_eq!(output, "*10:00:00 UTC");
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_prompt_fails_remaining_commands() {
        let io = ios_shell().hang_on("show hang");
        let mut shell = prepared(io, DeviceDialect::CiscoIos).await;

        assert!(shell
            .send_command("show hang")
            .await
            .unwrap_err()
            .is_command_timeout());

        let err = shell.send_command("show clock").await.unwrap_err();
        assert!(matches!(err, SessionError::Command(_)), "{err:?}");
        assert!(!shell.io.writes.iter().any(|w| w == "show clock"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_output_chunk_ending_in_percent_is_not_a_prompt() {
        let io = ScriptedShell::default()
            .reply("", &[(0, "\r\nops@box:~$ ")])
            .reply(
                "df -h",
                &[
                    (0, "df -h\r\nFilesystem Use%\r\n/dev/sda1 45%"),
                    (1, "\r\n/dev/sdb1 12%\r\nops@box:~$ "),
                ],
            )
            .reply("uptime", &[(0, "uptime\r\n up 3 days\r\nops@box:~$ ")]);
        let mut shell = prepared(io, DeviceDialect::Generic).await;

        assert_eq!(
            shell.send_command("df -h").await.unwrap(),
            "Filesystem Use%\n/dev/sda1 45%\n/dev/sdb1 12%"
        );
        assert_eq!(shell.send_command("uptime").await.unwrap(), " up 3 days");
    }
}
