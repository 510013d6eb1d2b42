// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::service::service_fn;
use hyper::{http, Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioIo, TokioTimer};
use libdd_mxcrash::pipeline::envelope_from_body;
use libdd_mxcrash::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::http_utils::{
    log_and_create_http_response, verify_request_content_length, HttpResponse,
};
use crate::uploader::EnvelopeUploader;

pub const MX_CRASH_DIAGNOSTIC_PATH: &str = "/mx-crash-diagnostic";

const ERROR_MESSAGE_PREFIX: &str = "Error processing crash diagnostic";

pub struct CrashRelay {
    pub config: Arc<Config>,
    pub uploader: Arc<dyn EnvelopeUploader + Send + Sync>,
}

impl CrashRelay {
    /// Binds the configured address and serves until the listener fails.
    pub async fn start_relay(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind((self.config.host.as_str(), self.config.port))
            .await
            .with_context(|| {
                format!(
                    "failed to listen on {}:{}",
                    self.config.host, self.config.port
                )
            })?;
        info!(
            "MetricKit crash relay listening on {}",
            listener.local_addr()?
        );
        self.serve(listener).await
    }

    /// Serves every connection accepted by `listener`, one task per connection.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        let config = self.config.clone();
        let uploader = self.uploader.clone();
        let service = service_fn(move |req: Request<hyper::body::Incoming>| {
            CrashRelay::endpoint_handler(config.clone(), uploader.clone(), req)
        });

        let mut server = hyper::server::conn::http1::Builder::new();
        server
            .timer(TokioTimer::new())
            .header_read_timeout(self.config.read_timeout);

        let mut joinset = tokio::task::JoinSet::new();
        loop {
            let conn = tokio::select! {
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        error!("Server error: {e}");
                        return Err(e.into());
                    }
                    Ok((conn, _)) => conn,
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => {
                    if let Err(e) = finished {
                        error!("Connection task failed: {e}");
                    }
                    continue;
                },
            };
            let conn = TokioIo::new(conn);
            let server = server.clone();
            let service = service.clone();
            joinset.spawn(async move {
                if let Err(e) = server.serve_connection(conn, service).await {
                    error!("Connection error: {e}");
                }
            });
        }
    }

    pub async fn endpoint_handler<B>(
        config: Arc<Config>,
        uploader: Arc<dyn EnvelopeUploader + Send + Sync>,
        req: Request<B>,
    ) -> http::Result<HttpResponse>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match (req.method(), req.uri().path()) {
            (&Method::POST, MX_CRASH_DIAGNOSTIC_PATH) => {
                Self::crash_diagnostic_handler(config, uploader, req).await
            }
            _ => {
                let mut not_found = Response::default();
                *not_found.status_mut() = StatusCode::NOT_FOUND;
                Ok(not_found)
            }
        }
    }

    async fn crash_diagnostic_handler<B>(
        config: Arc<Config>,
        uploader: Arc<dyn EnvelopeUploader + Send + Sync>,
        req: Request<B>,
    ) -> http::Result<HttpResponse>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();

        if let Some(response) = verify_request_content_length(
            &parts.headers,
            config.max_request_content_length,
            ERROR_MESSAGE_PREFIX,
        ) {
            return response;
        }

        let collected = tokio::time::timeout(
            config.read_timeout,
            Limited::new(body, config.max_request_content_length).collect(),
        )
        .await;
        let body = match collected {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(e)) if e.is::<LengthLimitError>() => {
                return log_and_create_http_response(
                    &format!("{ERROR_MESSAGE_PREFIX}: Payload too large"),
                    StatusCode::PAYLOAD_TOO_LARGE,
                );
            }
            Ok(Err(e)) => {
                return log_and_create_http_response(
                    &format!("{ERROR_MESSAGE_PREFIX}: failed to read request body: {e}"),
                    StatusCode::BAD_REQUEST,
                );
            }
            Err(_) => {
                return log_and_create_http_response(
                    &format!(
                        "{ERROR_MESSAGE_PREFIX}: request body not received within {} ms",
                        config.read_timeout.as_millis()
                    ),
                    StatusCode::REQUEST_TIMEOUT,
                );
            }
        };

        let envelope = match envelope_from_body(&body, &config.mxcrash) {
            Ok(envelope) => envelope,
            Err(e) => {
                return log_and_create_http_response(
                    &format!("{ERROR_MESSAGE_PREFIX}: {e}"),
                    error_status(&e),
                );
            }
        };

        let event_id = envelope.event_id().simple();
        debug!(
            "Envelope for event {event_id}: {}",
            String::from_utf8_lossy(envelope.as_bytes())
        );

        match uploader.upload(envelope).await {
            Ok(()) => log_and_create_http_response(
                &format!("Crash diagnostic sent to Sentry as event {event_id}"),
                StatusCode::OK,
            ),
            Err(e) => log_and_create_http_response(
                &format!("{ERROR_MESSAGE_PREFIX}: event {event_id}: {e}"),
                error_status(&e),
            ),
        }
    }
}

fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::MalformedInput(_) => StatusCode::BAD_REQUEST,
        Error::UnsupportedDiagnosticShape(_) | Error::IncompleteCrashTree(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::SerializationFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::DeliveryFailure(_) => StatusCode::BAD_GATEWAY,
    }
}
