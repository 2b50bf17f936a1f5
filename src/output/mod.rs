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

//! Output sinks for device results.
//!
//! Every sink renders the same block per command:
//!
//! ```text
//!
//! !!!!!!! <command> on <host> at <timestamp>
//!
//! <result>
//! ```

mod console;
mod file;

use async_trait::async_trait;
use owo_colors::OwoColorize;

use crate::executor::{DeviceResult, Timestamp};

pub use console::{should_use_colors, ConsoleSink};
pub use file::FileSink;

/// Timestamp layout used in rendered headers.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Header marker preceding each command's output.
const HEADER_MARKER: &str = "!!!!!!!";

/// Consumer of device results after each batch.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Short name used in failure diagnostics, e.g. "console" or "file".
    fn name(&self) -> &str;

    async fn write(&self, result: &DeviceResult) -> anyhow::Result<()>;
}

pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Render every (command, result, timestamp) triple of `result`.
pub fn render_device_result(result: &DeviceResult, colored: bool) -> String {
    let mut rendered = String::new();
    for (command, text, timestamp) in result.entries() {
        let header = format!(
            "{HEADER_MARKER} {command} on {} at {}",
            result.hostname(),
            format_timestamp(timestamp)
        );
        rendered.push('\n');
        if colored {
            rendered.push_str(&header.bold().cyan().to_string());
        } else {
            rendered.push_str(&header);
        }
        rendered.push_str("\n\n");
        rendered.push_str(text);
    }
    rendered
}
