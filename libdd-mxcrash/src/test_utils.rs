// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::diagnostic::{
    CallStack, CallStackFrame, CallStackTree, CrashDiagnosticRequest, DiagnosticMetaData,
};

/// Builds a single root frame whose sub-frame chain follows `frames`, the
/// first entry being the root. Entries are `(uuid, name, address, offset)`.
pub fn frame_chain(frames: &[(&str, &str, i64, i64)]) -> Vec<CallStackFrame> {
    let mut chain: Option<CallStackFrame> = None;
    for (uuid, name, address, offset) in frames.iter().rev() {
        let mut frame = CallStackFrame::new(uuid, name, *address, *offset);
        if let Some(sub_frame) = chain.take() {
            frame = frame.with_sub_frame(sub_frame);
        }
        chain = Some(frame);
    }
    chain.into_iter().collect()
}

pub fn call_stack(root_frames: Vec<CallStackFrame>, thread_attributed: bool) -> CallStack {
    CallStack {
        call_stack_root_frames: root_frames,
        thread_attributed,
    }
}

pub fn call_stack_tree(call_stacks: Vec<CallStack>) -> CallStackTree {
    CallStackTree {
        call_stacks,
        call_stack_per_thread: true,
    }
}

pub fn request(
    call_stacks: Vec<CallStack>,
    meta_data: DiagnosticMetaData,
) -> CrashDiagnosticRequest {
    CrashDiagnosticRequest {
        call_stack_tree: call_stack_tree(call_stacks),
        diagnostic_meta_data: meta_data,
    }
}

/// One attributed thread with a single `Lib` frame at 1000 (offset 100),
/// exception type 1, code 2, signal 11.
pub fn single_frame_request() -> CrashDiagnosticRequest {
    request(
        vec![call_stack(frame_chain(&[("X", "Lib", 1000, 100)]), true)],
        DiagnosticMetaData {
            exception_type: 1,
            exception_code: 2,
            signal: 11,
        },
    )
}
