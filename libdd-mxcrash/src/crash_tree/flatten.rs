// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::{Binary, StackFrame};
use crate::diagnostic::{CallStack, CallStackFrame};
use tracing::debug;

/// Unnests a call stack into a list of frames, innermost frame first and the
/// root frame last.
///
/// Only the first sub-frame of every level is followed. Any sibling after it
/// is dropped.
pub fn flatten_call_stack(root_frames: &[CallStackFrame], in_app_marker: &str) -> Vec<StackFrame> {
    let mut chain = Vec::new();
    let mut level = root_frames;
    while let Some(frame) = level.first() {
        if level.len() > 1 {
            debug!(
                "Ignoring {} sibling frames below binary {:?}",
                level.len() - 1,
                frame.binary_name
            );
        }
        chain.push(frame);
        level = &frame.sub_frames;
    }

    chain
        .into_iter()
        .rev()
        .map(|frame| StackFrame::from_call_stack_frame(frame, in_app_marker))
        .collect()
}

/// Index of the first call stack attributed to the crash, falling back to the
/// first one.
pub fn crashed_thread_index(call_stacks: &[CallStack]) -> usize {
    call_stacks
        .iter()
        .position(|call_stack| call_stack.thread_attributed)
        .unwrap_or(0)
}

impl StackFrame {
    pub fn from_call_stack_frame(frame: &CallStackFrame, in_app_marker: &str) -> Self {
        Self {
            binary: Binary {
                uuid: frame.binary_uuid.clone(),
                name: frame.binary_name.clone(),
            },
            instruction_address: frame.address,
            image_address: frame
                .address
                .wrapping_sub(frame.offset_into_binary_text_segment),
            in_app: is_in_app(&frame.binary_name, in_app_marker),
        }
    }
}

fn is_in_app(binary_name: &str, in_app_marker: &str) -> bool {
    !in_app_marker.is_empty() && binary_name.contains(in_app_marker)
}
