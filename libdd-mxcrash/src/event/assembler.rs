// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::schema::*;
use crate::crash_tree::{CrashTree, ImageCatalog};
use crate::diagnostic::DiagnosticMetaData;
use crate::error::Result;
use chrono::{DateTime, Utc};

pub const EXCEPTION_TYPE: &str = "MXCrashDiagnostic";
pub const EXCEPTION_VALUE: &str = "MetricKit > MXDiagnostic > Crash in SDK";
pub const MECHANISM_TYPE: &str = "MXCrashDiagnostic";

/// Builds the Sentry event describing a crash.
///
/// Fails with `IncompleteCrashTree` when the crashed thread has no frames.
pub fn assemble_event(
    crash_tree: &CrashTree,
    images: &ImageCatalog,
    meta_data: &DiagnosticMetaData,
    captured_at: DateTime<Utc>,
) -> Result<SentryEvent> {
    let crashed_thread = crash_tree.crashed_thread()?;
    let subcode = crash_tree.crashing_instruction_address()?;

    let mechanism = Mechanism {
        mechanism_type: MECHANISM_TYPE.to_string(),
        meta: MechanismMeta {
            signal: Some(Signal {
                number: meta_data.signal,
            }),
            mach_exception: Some(MachException {
                code: meta_data.exception_code,
                subcode,
                exception: meta_data.exception_type,
            }),
        },
        handled: false,
    };

    let exception = ExceptionValue {
        exception_type: EXCEPTION_TYPE.to_string(),
        value: EXCEPTION_VALUE.to_string(),
        stacktrace: Stacktrace::from(crashed_thread.stack_frames.as_slice()),
        mechanism,
        thread_id: crashed_thread.id,
    };

    let threads = crash_tree
        .threads()
        .iter()
        .map(|thread| ThreadValue {
            stacktrace: Stacktrace::from(thread.stack_frames.as_slice()),
            id: thread.id,
            crashed: thread.id == crash_tree.crashed_thread_id(),
        })
        .collect();

    Ok(SentryEvent {
        platform: PLATFORM.to_string(),
        level: LEVEL.to_string(),
        exception: Exception {
            values: vec![exception],
        },
        threads: Threads { values: threads },
        debug_meta: DebugMeta {
            images: images.iter().map(DebugImage::from).collect(),
        },
        timestamp: captured_at.timestamp(),
    })
}
