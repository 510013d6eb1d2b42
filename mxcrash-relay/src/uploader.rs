// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{header, Method, Request, StatusCode, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use libdd_mxcrash::envelope::{Envelope, ENVELOPE_CONTENT_TYPE};
use libdd_mxcrash::{Error, Result};
use tracing::debug;

use crate::config::Config;

pub const SENTRY_AUTH_HEADER: &str = "x-sentry-auth";
const SENTRY_CLIENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait EnvelopeUploader {
    /// Sends an envelope to Sentry. Anything but a 200 response is a `DeliveryFailure`.
    async fn upload(&self, envelope: Envelope) -> Result<()>;
}

pub struct HttpEnvelopeUploader {
    client: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    endpoint: Uri,
    auth_header: String,
    timeout: Duration,
}

impl HttpEnvelopeUploader {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let dsn = &config.mxcrash.dsn;
        let endpoint: Uri = dsn
            .envelope_endpoint()
            .parse()
            .context("invalid Sentry envelope endpoint")?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())
            .context("failed to set up TLS")?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            endpoint,
            auth_header: dsn.auth_header(SENTRY_CLIENT),
            timeout: config.upload_timeout,
        })
    }

    async fn send(&self, request: Request<Full<Bytes>>) -> Result<()> {
        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| Error::DeliveryFailure(format!("request to Sentry failed: {e:?}")))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .into_body()
                .collect()
                .await
                .map(|collected| collected.to_bytes())
                .unwrap_or_default();
            return Err(Error::DeliveryFailure(format!(
                "Sentry responded with {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EnvelopeUploader for HttpEnvelopeUploader {
    async fn upload(&self, envelope: Envelope) -> Result<()> {
        let event_id = envelope.event_id();
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(header::CONTENT_TYPE, ENVELOPE_CONTENT_TYPE)
            .header(SENTRY_AUTH_HEADER, self.auth_header.as_str())
            .body(Full::new(Bytes::from(envelope.into_bytes())))
            .map_err(|e| Error::DeliveryFailure(e.to_string()))?;

        tokio::time::timeout(self.timeout, self.send(request))
            .await
            .map_err(|_| {
                Error::DeliveryFailure(format!(
                    "no response from Sentry within {} ms",
                    self.timeout.as_millis()
                ))
            })??;

        debug!("Envelope {} accepted by {}", event_id.simple(), self.endpoint);
        Ok(())
    }
}
