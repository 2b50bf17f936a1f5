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

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::{render_device_result, OutputSink};
use crate::executor::DeviceResult;

/// Appends rendered results to one log file per host.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Log file for `hostname`: `<dir>/netwatch_output_<hostname>.log`.
    pub fn path_for(&self, hostname: &str) -> PathBuf {
        let host = hostname.replace([':', '/', '\\'], "_");
        self.dir.join(format!("netwatch_output_{host}.log"))
    }
}

#[async_trait]
impl OutputSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn write(&self, result: &DeviceResult) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create output directory: {:?}", self.dir))?;

        let path = self.path_for(result.hostname());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open output file: {path:?}"))?;

        let rendered = render_device_result(result, false);
        file.write_all(rendered.as_bytes())
            .await
            .with_context(|| format!("Failed to write output file: {path:?}"))?;
        file.flush().await?;

        tracing::debug!("Appended {} result(s) to {:?}", result.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandResult;
    use tempfile::TempDir;

    #[test]
    fn test_path_for_sanitizes_host() {
        let sink = FileSink::new("/var/log/netwatch");
        assert_eq!(
            sink.path_for("fe80::1"),
            PathBuf::from("/var/log/netwatch/netwatch_output_fe80__1.log")
        );
        assert_eq!(
            sink.path_for("a/b\\c"),
            PathBuf::from("/var/log/netwatch/netwatch_output_a_b_c.log")
        );
    }

    #[tokio::test]
    async fn test_write_appends_across_iterations() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("logs");
        let sink = FileSink::new(&dir);

        let result = DeviceResult::from_command_results(
            "10.1.1.1",
            vec![("show clock".to_string(), CommandResult::now("12:00"))],
        );
        sink.write(&result).await.unwrap();
        sink.write(&result).await.unwrap();

        let contents = std::fs::read_to_string(sink.path_for("10.1.1.1")).unwrap();
        assert_eq!(contents.matches("!!!!!!! show clock on 10.1.1.1 at ").count(), 2);
        assert!(contents.starts_with('\n'));
        assert!(contents.ends_with("12:00"));
    }
}
