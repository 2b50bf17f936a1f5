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

use async_trait::async_trait;
use std::io::{self, IsTerminal, Write};

use super::{render_device_result, OutputSink};
use crate::executor::DeviceResult;

/// Prints rendered results to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    colored: bool,
}

impl ConsoleSink {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }
}

#[async_trait]
impl OutputSink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn write(&self, result: &DeviceResult) -> anyhow::Result<()> {
        let rendered = render_device_result(result, self.colored);
        // One locked write per device keeps blocks from different devices
        // from interleaving.
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{rendered}")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Whether console output should carry ANSI colors.
pub fn should_use_colors(no_color: bool) -> bool {
    if no_color || !io::stdout().is_terminal() {
        return false;
    }

    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_flag_wins() {
        assert!(!should_use_colors(true));
    }

    #[tokio::test]
    async fn test_console_sink_writes() {
        let sink = ConsoleSink::new(false);
        let result = DeviceResult::from_command_results("r1", Vec::new());
        assert_eq!(sink.name(), "console");
        assert!(sink.write(&result).await.is_ok());
    }
}
