// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Sentry envelope framing: an envelope header line, an item header line and
//! the event payload. See <https://develop.sentry.dev/sdk/envelopes/>.

use crate::error::Result;
use crate::event::SentryEvent;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

pub const ENVELOPE_CONTENT_TYPE: &str = "application/x-sentry-envelope";
const ITEM_TYPE_EVENT: &str = "event";
const ITEM_CONTENT_TYPE: &str = "application/json";
const SENTRY_PROTOCOL_VERSION: u8 = 7;

/// Destination of the envelopes: the client key, the Sentry host and the
/// project the events are filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentryDsn {
    scheme: String,
    public_key: String,
    host: String,
    project_id: u64,
}

impl SentryDsn {
    pub fn new(scheme: &str, public_key: &str, host: &str, project_id: u64) -> Self {
        Self {
            scheme: scheme.to_string(),
            public_key: public_key.to_string(),
            host: host.to_string(),
            project_id,
        }
    }

    /// `<scheme>://<host>/api/<project>/envelope/`
    pub fn envelope_endpoint(&self) -> String {
        format!(
            "{}://{}/api/{}/envelope/",
            self.scheme, self.host, self.project_id
        )
    }

    /// Value of the `X-Sentry-Auth` header for requests sent by `client`.
    pub fn auth_header(&self, client: &str) -> String {
        format!(
            "Sentry sentry_version={SENTRY_PROTOCOL_VERSION}, sentry_key={}, sentry_client={client}",
            self.public_key
        )
    }
}

impl fmt::Display for SentryDsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}@{}/{}",
            self.scheme, self.public_key, self.host, self.project_id
        )
    }
}

impl Serialize for SentryDsn {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Serialize)]
struct EnvelopeHeader<'a> {
    event_id: String,
    dsn: &'a SentryDsn,
    sent_at: String,
}

#[derive(Debug, Serialize)]
struct ItemHeader {
    #[serde(rename = "type")]
    item_type: &'static str,
    content_type: &'static str,
    length: usize,
}

/// A fully framed envelope carrying a single event item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    event_id: Uuid,
    bytes: Vec<u8>,
}

impl Envelope {
    pub fn new(
        dsn: &SentryDsn,
        event: &SentryEvent,
        event_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> Result<Self> {
        let payload = serde_json::to_vec(event)?;
        let header = serde_json::to_vec(&EnvelopeHeader {
            event_id: event_id.simple().to_string(),
            dsn,
            sent_at: sent_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        })?;
        let item_header = serde_json::to_vec(&ItemHeader {
            item_type: ITEM_TYPE_EVENT,
            content_type: ITEM_CONTENT_TYPE,
            length: payload.len(),
        })?;

        let mut bytes = Vec::with_capacity(header.len() + item_header.len() + payload.len() + 2);
        bytes.extend_from_slice(&header);
        bytes.push(b'\n');
        bytes.extend_from_slice(&item_header);
        bytes.push(b'\n');
        bytes.extend_from_slice(&payload);

        Ok(Self { event_id, bytes })
    }

    /// Frames `event` with a random event id, stamped with the current time.
    pub fn from_event(dsn: &SentryDsn, event: &SentryEvent) -> Result<Self> {
        Self::new(dsn, event, Uuid::new_v4(), Utc::now())
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
