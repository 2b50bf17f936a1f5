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

//! In-memory session doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netwatch::credentials::{CredentialPrompt, Credentials};
use netwatch::device::DeviceSettings;
use netwatch::executor::DeviceResult;
use netwatch::output::OutputSink;
use netwatch::session::{DeviceSession, SessionConnector, SessionError};

pub const GOOD_PASSWORD: &str = "correct horse";

/// How a host reacts to `open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostBehavior {
    Accept,
    ConnectTimeout,
    Refuse(String),
    Panic,
}

/// How a command reacts to `send_command`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandBehavior {
    Timeout,
    Fail(String),
}

#[derive(Debug, Default)]
struct Counters {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    opens: AtomicUsize,
}

impl Counters {
    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted connector. Hosts accept by default, and only `GOOD_PASSWORD`
/// authenticates.
#[derive(Debug, Default)]
pub struct MockConnector {
    hosts: HashMap<String, HostBehavior>,
    commands: HashMap<String, CommandBehavior>,
    connect_delay: HashMap<String, Duration>,
    command_delay: Duration,
    counters: Arc<Counters>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, hostname: &str, behavior: HostBehavior) -> Self {
        self.hosts.insert(hostname.to_string(), behavior);
        self
    }

    pub fn with_command(mut self, command: &str, behavior: CommandBehavior) -> Self {
        self.commands.insert(command.to_string(), behavior);
        self
    }

    pub fn with_connect_delay(mut self, hostname: &str, delay: Duration) -> Self {
        self.connect_delay.insert(hostname.to_string(), delay);
        self
    }

    pub fn with_command_delay(mut self, delay: Duration) -> Self {
        self.command_delay = delay;
        self
    }

    /// Highest number of sessions that were open at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::SeqCst)
    }

    /// Number of `open` calls, successful or not.
    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for MockConnector {
    type Session = MockSession;

    async fn open(
        &self,
        device: &DeviceSettings,
        credentials: &Credentials,
    ) -> Result<MockSession, SessionError> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        self.counters.enter();
        let guard = InFlight(Arc::clone(&self.counters));

        if let Some(delay) = self.connect_delay.get(&device.hostname) {
            tokio::time::sleep(*delay).await;
        }

        match self.hosts.get(&device.hostname).unwrap_or(&HostBehavior::Accept) {
            HostBehavior::Accept => {}
            HostBehavior::ConnectTimeout => {
                return Err(SessionError::ConnectTimeout(format!(
                    "connection to {} timed out",
                    device.address()
                )))
            }
            HostBehavior::Refuse(reason) => return Err(SessionError::connection(reason.clone())),
            HostBehavior::Panic => panic!("mock panic on {}", device.hostname),
        }

        if credentials.password().expose_secret() != GOOD_PASSWORD {
            return Err(SessionError::auth(format!(
                "password rejected for {}",
                credentials.username()
            )));
        }

        Ok(MockSession {
            hostname: device.hostname.clone(),
            commands: self.commands.clone(),
            command_delay: self.command_delay,
            _guard: guard,
        })
    }
}

struct InFlight(Arc<Counters>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.leave();
    }
}

pub struct MockSession {
    hostname: String,
    commands: HashMap<String, CommandBehavior>,
    command_delay: Duration,
    _guard: InFlight,
}

impl std::fmt::Debug for MockSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSession")
            .field("hostname", &self.hostname)
            .finish()
    }
}

#[async_trait]
impl DeviceSession for MockSession {
    async fn send_command(&mut self, command: &str) -> Result<String, SessionError> {
        if !self.command_delay.is_zero() {
            tokio::time::sleep(self.command_delay).await;
        }
        match self.commands.get(command) {
            Some(CommandBehavior::Timeout) => Err(SessionError::CommandTimeout(60)),
            Some(CommandBehavior::Fail(reason)) => Err(SessionError::command(reason.clone())),
            None => Ok(format!("{}: {}", self.hostname, command)),
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Prompt that replays canned answers and records notifications.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<(String, String)>,
    pub notifications: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(u, p)| (u.to_string(), p.to_string()))
                .collect(),
            notifications: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl CredentialPrompt for ScriptedPrompt {
    fn read_username(&mut self) -> io::Result<String> {
        self.answers
            .front()
            .map(|(user, _)| user.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more answers"))
    }

    fn read_password(&mut self) -> io::Result<SecretString> {
        let (_, password) = self
            .answers
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more answers"))?;
        Ok(SecretString::new(password.into()))
    }

    fn notify(&mut self, message: &str) {
        self.notifications.push(message.to_string());
    }
}

/// Sink that remembers which hosts it saw, in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub seen: Arc<Mutex<Vec<DeviceResult>>>,
}

impl RecordingSink {
    pub fn hostnames(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.hostname().to_string())
            .collect()
    }
}

#[async_trait]
impl OutputSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn write(&self, result: &DeviceResult) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// Sink that rejects every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

#[async_trait]
impl OutputSink for FailingSink {
    fn name(&self) -> &str {
        "broken"
    }

    async fn write(&self, _result: &DeviceResult) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}

pub fn credentials() -> Arc<Credentials> {
    Arc::new(Credentials::new(
        "netops",
        SecretString::new(GOOD_PASSWORD.into()),
    ))
}

pub fn device(hostname: &str, commands: &[&str]) -> DeviceSettings {
    DeviceSettings::new(
        hostname,
        "cisco_ios",
        22,
        commands.iter().map(|c| c.to_string()).collect(),
    )
}

pub fn devices(count: usize, commands: &[&str]) -> Arc<[DeviceSettings]> {
    (0..count)
        .map(|i| device(&format!("r{i}"), commands))
        .collect::<Vec<_>>()
        .into()
}
