// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Wire model of the MetricKit `MXCrashDiagnostic` payload as posted by the
//! devices. Every field defaults to its zero value when absent.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Nesting bound checked before decoding. Every call stack frame costs two
/// levels (the `subFrames` array and the frame object).
pub const MAX_NESTING_DEPTH: usize = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrashDiagnosticRequest {
    pub call_stack_tree: CallStackTree,
    pub diagnostic_meta_data: DiagnosticMetaData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallStackTree {
    pub call_stacks: Vec<CallStack>,
    pub call_stack_per_thread: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallStack {
    pub call_stack_root_frames: Vec<CallStackFrame>,
    pub thread_attributed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
// Field-level defaults: a container-level default would move out of a `Drop` type.
#[serde(rename_all = "camelCase")]
pub struct CallStackFrame {
    #[serde(rename = "binaryUUID", default)]
    pub binary_uuid: String,
    #[serde(default)]
    pub binary_name: String,
    #[serde(default)]
    pub sub_frames: Vec<CallStackFrame>,
    #[serde(default)]
    pub offset_into_binary_text_segment: i64,
    #[serde(default)]
    pub address: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiagnosticMetaData {
    pub exception_type: i64,
    pub exception_code: i64,
    pub signal: i64,
}

impl CrashDiagnosticRequest {
    /// Decodes a request body, rejecting documents nested deeper than
    /// [`MAX_NESTING_DEPTH`] before handing them to the deserializer.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let depth = max_nesting_depth(body);
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::MalformedInput(format!(
                "document nesting depth {depth} exceeds the limit of {MAX_NESTING_DEPTH}"
            )));
        }

        let mut deserializer = serde_json::Deserializer::from_slice(body);
        deserializer.disable_recursion_limit();
        // Grows the stack on demand, decoding recurses once per nesting level.
        let request = Self::deserialize(serde_stacker::Deserializer::new(&mut deserializer))
            .and_then(|request| deserializer.end().map(|()| request))
            .map_err(|e| Error::MalformedInput(e.to_string()))?;
        Ok(request)
    }
}

impl CallStackFrame {
    pub fn new(binary_uuid: &str, binary_name: &str, address: i64, offset: i64) -> Self {
        Self {
            binary_uuid: binary_uuid.to_string(),
            binary_name: binary_name.to_string(),
            sub_frames: vec![],
            offset_into_binary_text_segment: offset,
            address,
        }
    }

    pub fn with_sub_frame(mut self, frame: CallStackFrame) -> Self {
        self.sub_frames.push(frame);
        self
    }
}

impl Drop for CallStackFrame {
    fn drop(&mut self) {
        // Detach the sub-frames so each frame drops with an empty list.
        let mut pending = std::mem::take(&mut self.sub_frames);
        while let Some(mut frame) = pending.pop() {
            pending.append(&mut frame.sub_frames);
        }
    }
}

/// Deepest `{`/`[` nesting in a JSON document, ignoring brackets inside
/// strings. Iterative so adversarial input cannot exhaust the stack here.
fn max_nesting_depth(body: &[u8]) -> usize {
    let mut depth = 0usize;
    let mut max_depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for byte in body {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max_depth
}
