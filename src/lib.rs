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

//! Periodic SSH polling of network devices.
//!
//! A run validates one set of operator credentials against the first device,
//! then repeatedly executes every device's command list through a bounded
//! worker pool and hands the per-device results to the enabled output sinks.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod device;
pub mod executor;
pub mod output;
pub mod poller;
pub mod session;
pub mod utils;

pub use cli::Cli;
pub use config::Config;
pub use credentials::Credentials;
pub use device::DeviceSettings;
pub use executor::{BatchScheduler, DeviceResult};
pub use poller::{PollSettings, PollSummary, Poller};
