// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use mxcrash_relay::{config, relay::CrashRelay, uploader::HttpEnvelopeUploader};

pub fn main() -> ExitCode {
    let config = match config::Config::new() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            // The subscriber is not installed yet.
            eprintln!("Error creating config on MetricKit crash relay startup: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", config.log_level);
    let env_filter = match EnvFilter::try_new(env_filter) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("could not parse log level in configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(false)
        .without_time()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
        return ExitCode::FAILURE;
    }

    debug!("Logging subsystem enabled");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Error creating the tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async move {
        let uploader = match HttpEnvelopeUploader::new(&config) {
            Ok(uploader) => Arc::new(uploader),
            Err(e) => {
                error!("Error creating the Sentry uploader: {e:#}");
                return ExitCode::FAILURE;
            }
        };
        info!(
            "Forwarding crash diagnostics to {}",
            config.mxcrash.dsn.envelope_endpoint()
        );

        let relay = CrashRelay { config, uploader };
        match relay.start_relay().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Error when running the MetricKit crash relay: {e:#}");
                ExitCode::FAILURE
            }
        }
    })
}
