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

//! Fixed-size worker pool that runs one device task per device.

use chrono::Local;
use futures::future::join_all;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinError;

use super::device_task::execute_device;
use super::result_types::DeviceResult;
use crate::credentials::Credentials;
use crate::device::DeviceSettings;
use crate::session::SessionConnector;

/// Shared queue of device indices still waiting for a worker.
type TaskQueue = Arc<Mutex<VecDeque<usize>>>;

/// Dispatches device tasks across a bounded pool of workers.
///
/// Workers are tokio tasks on the multi-threaded runtime, so device tasks run
/// in parallel on OS threads. At most `workers` devices are in flight at any
/// moment. Results come back in the order of the input device list no matter
/// which device finishes first.
pub struct BatchScheduler<C> {
    connector: Arc<C>,
    workers: usize,
}

impl<C> BatchScheduler<C>
where
    C: SessionConnector,
{
    pub fn new(connector: Arc<C>, workers: usize) -> Self {
        Self {
            connector,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn connector(&self) -> &Arc<C> {
        &self.connector
    }

    /// Run every device once and return one result per device, in input order.
    ///
    /// Blocks until all device tasks have completed. Nothing is retried.
    pub async fn run_batch(
        &self,
        devices: &Arc<[DeviceSettings]>,
        credentials: &Arc<Credentials>,
    ) -> Vec<DeviceResult> {
        let total = devices.len();
        if total == 0 {
            return Vec::new();
        }

        let worker_count = self.workers.min(total);
        let queue: TaskQueue = Arc::new(Mutex::new((0..total).collect()));
        let (tx, mut rx) = mpsc::unbounded_channel::<(usize, DeviceResult)>();

        tracing::debug!(
            "Dispatching {} device task(s) across {} worker(s)",
            total,
            worker_count
        );

        let handles: Vec<_> = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(worker_loop(
                    worker_id,
                    Arc::clone(&self.connector),
                    Arc::clone(devices),
                    Arc::clone(credentials),
                    Arc::clone(&queue),
                    tx.clone(),
                ))
            })
            .collect();
        drop(tx);

        let mut slots: Vec<Option<DeviceResult>> = (0..total).map(|_| None).collect();
        while let Some((index, result)) = rx.recv().await {
            slots[index] = Some(result);
        }

        for (worker_id, joined) in join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = joined {
                tracing::error!("Batch worker {} terminated abnormally: {}", worker_id, e);
            }
        }

        slots
            .into_iter()
            .zip(devices.iter())
            .map(|(slot, device)| {
                slot.unwrap_or_else(|| {
                    DeviceResult::unreachable(device, &"device task aborted", Local::now())
                })
            })
            .collect()
    }
}

fn next_task(queue: &TaskQueue) -> Option<usize> {
    match queue.lock() {
        Ok(mut pending) => pending.pop_front(),
        Err(poisoned) => poisoned.into_inner().pop_front(),
    }
}

async fn worker_loop<C>(
    worker_id: usize,
    connector: Arc<C>,
    devices: Arc<[DeviceSettings]>,
    credentials: Arc<Credentials>,
    queue: TaskQueue,
    results: mpsc::UnboundedSender<(usize, DeviceResult)>,
) where
    C: SessionConnector,
{
    while let Some(index) = next_task(&queue) {
        let device_task = {
            let connector = Arc::clone(&connector);
            let devices = Arc::clone(&devices);
            let credentials = Arc::clone(&credentials);
            tokio::spawn(async move {
                execute_device(connector.as_ref(), &devices[index], &credentials).await
            })
        };

        // The device task runs in its own tokio task so a panic inside a
        // session adapter only costs that device, not this worker.
        let result = match device_task.await {
            Ok(result) => result,
            Err(e) => aborted_result(&devices[index], worker_id, e),
        };

        if results.send((index, result)).is_err() {
            tracing::debug!("Result collector closed; worker {} exiting", worker_id);
            break;
        }
    }
}

fn aborted_result(device: &DeviceSettings, worker_id: usize, error: JoinError) -> DeviceResult {
    tracing::error!(
        "Device task for {} on worker {} aborted: {}",
        device.hostname,
        worker_id,
        error
    );
    let reason = if error.is_panic() {
        format!("device task aborted: {}", panic_message(error.into_panic()))
    } else {
        format!("device task aborted: {error}")
    };
    DeviceResult::unreachable(device, &reason, Local::now())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}
