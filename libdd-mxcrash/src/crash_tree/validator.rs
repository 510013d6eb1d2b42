// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::diagnostic::CallStackTree;
use crate::error::{Error, Result};

/// Checks that `tree` is a shape the flattener understands and hands it back
/// unchanged.
///
/// MetricKit only reports crashes with one call stack per thread. The
/// aggregated-samples variant, and threads with more than one root frame,
/// are rejected.
pub fn validate_call_stack_tree(tree: &CallStackTree) -> Result<&CallStackTree> {
    if !tree.call_stack_per_thread {
        return Err(Error::UnsupportedDiagnosticShape(
            "not implemented for multiple call stacks per thread",
        ));
    }
    if tree
        .call_stacks
        .iter()
        .any(|call_stack| call_stack.call_stack_root_frames.len() > 1)
    {
        return Err(Error::UnsupportedDiagnosticShape(
            "not implemented for multiple root frames per call stack",
        ));
    }
    if tree.call_stacks.is_empty() {
        return Err(Error::UnsupportedDiagnosticShape(
            "diagnostic contains no call stacks",
        ));
    }
    Ok(tree)
}
