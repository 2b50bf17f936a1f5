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
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use netwatch::{
    cli::Cli,
    config::Config,
    credentials::{validate_credentials, TerminalPrompt},
    executor::BatchScheduler,
    output::{should_use_colors, ConsoleSink, FileSink},
    poller::Poller,
    session::SshConnector,
    utils::init_logging,
};

/// Exit status after a forced second interrupt.
const FORCED_EXIT_CODE: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut config = Config::load_with_priority(cli.config.as_deref()).await?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    let devices = config.device_settings()?;
    tracing::info!(
        "Loaded {} device(s), {} worker(s), max_iter={}, sleep_time={}s",
        devices.len(),
        config.threads,
        config.max_iter,
        config.sleep_time
    );

    let connector = Arc::new(SshConnector::new(config.session_options()));

    let mut prompt = TerminalPrompt::new().with_username(cli.username.clone());
    let credentials = validate_credentials(
        connector.as_ref(),
        &mut prompt,
        &devices[0],
        config.validation_policy(),
    )
    .await
    .context("Credential validation failed")?;

    // Installed only now so that Ctrl+C at the password prompt still
    // terminates the process immediately.
    let shutdown = CancellationToken::new();
    spawn_shutdown_listener(shutdown.clone());

    let scheduler = BatchScheduler::new(connector, config.threads);
    let mut poller = Poller::new(
        scheduler,
        devices,
        Arc::new(credentials),
        config.poll_settings(),
    );
    if config.print_output {
        poller = poller.with_sink(Box::new(ConsoleSink::new(should_use_colors(cli.no_color))));
    }
    if config.file_output {
        let dir = config.resolved_output_dir();
        tracing::info!("Writing device logs to {:?}", dir);
        poller = poller.with_sink(Box::new(FileSink::new(dir)));
    }

    let summary = poller.run(shutdown).await;
    if summary.interrupted {
        println!(
            "interrupted after {} iteration(s), exiting",
            summary.iterations
        );
    }
    tracing::info!("Completed {} iteration(s)", summary.iterations);

    Ok(())
}

/// Cancel `shutdown` on the first Ctrl+C or SIGTERM; exit on a second Ctrl+C.
fn spawn_shutdown_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        println!("\nstopping after the current step (CTRL+C again to quit now)");
        shutdown.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Second interrupt received, exiting immediately");
            std::process::exit(FORCED_EXIT_CODE);
        }
    });
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
