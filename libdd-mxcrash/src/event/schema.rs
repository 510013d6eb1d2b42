// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The subset of the Sentry event protocol produced for MetricKit crashes.
//! See <https://develop.sentry.dev/sdk/data-model/event-payloads/>.

use crate::crash_tree::{ImageDescriptor, StackFrame};
use serde::{Serialize, Serializer};
use std::fmt;

pub const PLATFORM: &str = "cocoa";
pub const LEVEL: &str = "fatal";
pub const IMAGE_TYPE_MACHO: &str = "macho";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentryEvent {
    pub platform: String,
    pub level: String,
    pub exception: Exception,
    pub threads: Threads,
    pub debug_meta: DebugMeta,
    /// Seconds since the epoch, UTC.
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exception {
    pub values: Vec<ExceptionValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExceptionValue {
    #[serde(rename = "type")]
    pub exception_type: String,
    pub value: String,
    pub stacktrace: Stacktrace,
    pub mechanism: Mechanism,
    pub thread_id: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mechanism {
    #[serde(rename = "type")]
    pub mechanism_type: String,
    pub meta: MechanismMeta,
    pub handled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MechanismMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mach_exception: Option<MachException>,
}

/// POSIX signal that terminated the process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub number: i64,
}

/// Mach exception triple on Apple platforms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachException {
    pub code: i64,
    pub subcode: i64,
    pub exception: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Threads {
    pub values: Vec<ThreadValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadValue {
    pub stacktrace: Stacktrace,
    pub id: usize,
    pub crashed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stacktrace {
    pub frames: Vec<Frame>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub package: String,
    pub image_addr: HexAddress,
    pub instruction_addr: HexAddress,
    pub in_app: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugMeta {
    pub images: Vec<DebugImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugImage {
    pub debug_id: String,
    #[serde(rename = "type")]
    pub image_type: String,
    pub image_addr: HexAddress,
}

/// An address rendered as `0x` followed by 16 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexAddress(pub i64);

impl fmt::Display for HexAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0 as u64)
    }
}

impl Serialize for HexAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<&StackFrame> for Frame {
    fn from(frame: &StackFrame) -> Self {
        Self {
            package: frame.binary.name.clone(),
            image_addr: HexAddress(frame.image_address),
            instruction_addr: HexAddress(frame.instruction_address),
            in_app: frame.in_app,
        }
    }
}

impl From<&[StackFrame]> for Stacktrace {
    fn from(frames: &[StackFrame]) -> Self {
        Self {
            frames: frames.iter().map(Frame::from).collect(),
        }
    }
}

impl From<&ImageDescriptor> for DebugImage {
    fn from(image: &ImageDescriptor) -> Self {
        Self {
            debug_id: image.uuid.clone(),
            image_type: IMAGE_TYPE_MACHO.to_string(),
            image_addr: HexAddress(image.image_address),
        }
    }
}
