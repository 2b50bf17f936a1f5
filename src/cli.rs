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

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(
    name = "netwatch",
    version,
    about = "Poll network devices over SSH on a schedule",
    long_about = "netwatch logs into every device in its configuration file, runs each device's command list,\nand prints or logs the output. The batch repeats every sleep_time seconds until max_iter\niterations have run (0 runs until interrupted).\n\nCredentials are prompted once and checked against the first device before any batch runs,\nso a mistyped password never reaches the rest of the fleet.",
    after_help = "EXAMPLES:\n  Run once with ./netwatch.yml:       netwatch\n  Use a specific file:                netwatch lab.yml\n  Poll every 5 minutes, forever:      netwatch --max-iter 0 --sleep-time 300\n  Skip the username prompt:           netwatch -u netops core.yml"
)]
pub struct Cli {
    #[arg(
        help = "Configuration file path [default: ./netwatch.yml, then ~/.config/netwatch/netwatch.yml]"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'u',
        long = "user",
        env = "NETWATCH_USERNAME",
        help = "Username for device logins (prompted when omitted)"
    )]
    pub username: Option<String>,

    #[arg(long, help = "Worker pool size, overrides 'threads'")]
    pub threads: Option<usize>,

    #[arg(
        long,
        help = "Number of iterations, overrides 'max_iter' (0 runs until interrupted)"
    )]
    pub max_iter: Option<u64>,

    #[arg(long, help = "Seconds between iterations, overrides 'sleep_time'")]
    pub sleep_time: Option<u64>,

    #[arg(long, help = "Directory for per-device log files, overrides 'output_dir'")]
    pub output_dir: Option<String>,

    #[arg(long, help = "Disable colored console output")]
    pub no_color: bool,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,
}

impl Cli {
    /// Apply command-line values on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(max_iter) = self.max_iter {
            config.max_iter = max_iter;
        }
        if let Some(sleep_time) = self.sleep_time {
            config.sleep_time = sleep_time;
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
    }
}
