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

//! The iteration loop: run a batch, hand results to the sinks, sleep, repeat.

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::credentials::Credentials;
use crate::device::DeviceSettings;
use crate::executor::{BatchScheduler, DeviceResult};
use crate::output::{format_timestamp, OutputSink};
use crate::session::SessionConnector;

/// Loop bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Number of batches to run; `0` runs until interrupted.
    pub max_iterations: u64,
    pub sleep_time: Duration,
}

impl PollSettings {
    pub fn new(max_iterations: u64, sleep_time: Duration) -> Self {
        Self {
            max_iterations,
            sleep_time,
        }
    }

    pub fn is_forever(&self) -> bool {
        self.max_iterations == 0
    }

    /// Whether `completed` batches reach the iteration bound.
    pub fn is_last(&self, completed: u64) -> bool {
        !self.is_forever() && completed >= self.max_iterations
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(60))
    }
}

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub iterations: u64,
    /// The loop stopped because of a shutdown request rather than reaching
    /// `max_iterations`.
    pub interrupted: bool,
}

pub struct Poller<C> {
    scheduler: BatchScheduler<C>,
    devices: Arc<[DeviceSettings]>,
    credentials: Arc<Credentials>,
    sinks: Vec<Box<dyn OutputSink>>,
    settings: PollSettings,
}

impl<C> Poller<C>
where
    C: SessionConnector,
{
    pub fn new(
        scheduler: BatchScheduler<C>,
        devices: impl Into<Arc<[DeviceSettings]>>,
        credentials: Arc<Credentials>,
        settings: PollSettings,
    ) -> Self {
        Self {
            scheduler,
            devices: devices.into(),
            credentials,
            sinks: Vec::new(),
            settings,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn OutputSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Run batches until the iteration bound is reached or `shutdown` fires.
    ///
    /// A shutdown request during a batch lets that batch and its sinks
    /// finish; a request during the sleep wakes the loop at once.
    pub async fn run(&self, shutdown: CancellationToken) -> PollSummary {
        let mut iterations: u64 = 0;

        loop {
            if shutdown.is_cancelled() {
                return PollSummary {
                    iterations,
                    interrupted: true,
                };
            }

            println!("running commands");
            let results = self
                .scheduler
                .run_batch(&self.devices, &self.credentials)
                .await;
            self.dispatch(&results).await;
            iterations += 1;
            self.report(iterations, &results);

            if self.settings.is_last(iterations) {
                return PollSummary {
                    iterations,
                    interrupted: false,
                };
            }

            if shutdown.is_cancelled() {
                tracing::info!("Shutdown requested, stopping after {} iteration(s)", iterations);
                return PollSummary {
                    iterations,
                    interrupted: true,
                };
            }

            println!(
                "sleeping for {} seconds (CTRL+C to quit)",
                self.settings.sleep_time.as_secs()
            );
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::info!("Shutdown requested while sleeping");
                    return PollSummary {
                        iterations,
                        interrupted: true,
                    };
                }
                _ = tokio::time::sleep(self.settings.sleep_time) => {}
            }
        }
    }

    /// Hand every result to every sink. Failures are reported and skipped.
    async fn dispatch(&self, results: &[DeviceResult]) {
        for result in results {
            for sink in &self.sinks {
                if let Err(e) = sink.write(result).await {
                    tracing::error!("{} sink failed for {}: {:#}", sink.name(), result.hostname(), e);
                    eprintln!(
                        "Exception occured while writing to {} for {}: {:#}",
                        sink.name(),
                        result.hostname(),
                        e
                    );
                }
            }
        }
    }

    fn report(&self, iterations: u64, results: &[DeviceResult]) {
        let reachable = results.iter().filter(|r| r.is_reachable()).count();
        tracing::info!(
            "Iteration {} finished: {}/{} device(s) reachable",
            iterations,
            reachable,
            results.len()
        );
        println!(
            "loop has executed {} time(s), last execution completed at {}",
            iterations,
            format_timestamp(&Local::now())
        );
        println!(
            "maximum iterations is {} (when set to 0 loop executes forever)",
            self.settings.max_iterations
        );
    }
}
