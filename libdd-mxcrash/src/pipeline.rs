// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic in, envelope out: validation, flattening, image collection,
//! event assembly and framing chained together.

use crate::config::MxCrashConfig;
use crate::crash_tree::{CrashTree, ImageCatalog};
use crate::diagnostic::CrashDiagnosticRequest;
use crate::envelope::Envelope;
use crate::error::Result;
use crate::event::assemble_event;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

pub fn build_envelope(
    request: &CrashDiagnosticRequest,
    config: &MxCrashConfig,
    now: DateTime<Utc>,
    event_id: Uuid,
) -> Result<Envelope> {
    let crash_tree =
        CrashTree::from_call_stack_tree(&request.call_stack_tree, &config.in_app_marker)?;
    let images = ImageCatalog::from_threads(crash_tree.threads());
    debug!(
        "Crash diagnostic has {} threads and {} images, thread {} crashed",
        crash_tree.threads().len(),
        images.len(),
        crash_tree.crashed_thread_id()
    );

    let event = assemble_event(&crash_tree, &images, &request.diagnostic_meta_data, now)?;
    Envelope::new(&config.dsn, &event, event_id, now)
}

/// Decodes a request body and converts it, using the current time and a
/// fresh event id.
pub fn envelope_from_body(body: &[u8], config: &MxCrashConfig) -> Result<Envelope> {
    let request = CrashDiagnosticRequest::from_slice(body)?;
    build_envelope(&request, config, Utc::now(), Uuid::new_v4())
}
