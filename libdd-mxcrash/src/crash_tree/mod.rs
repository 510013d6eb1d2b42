// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod flatten;
mod images;
mod validator;

pub use flatten::*;
pub use images::*;
pub use validator::*;

use crate::diagnostic::CallStackTree;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Binary {
    pub uuid: String,
    pub name: String,
}

/// One frame of a flattened call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub binary: Binary,
    /// Absolute address as reported by the device.
    pub instruction_address: i64,
    /// Load address of the owning binary: `instruction_address` minus the
    /// offset into its text segment.
    pub image_address: i64,
    pub in_app: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    /// Position of the call stack in the diagnostic, not an OS thread id.
    pub id: usize,
    /// Innermost frame first.
    pub stack_frames: Vec<StackFrame>,
}

/// The validated and flattened form of a crash diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashTree {
    threads: Vec<Thread>,
    crashed_thread_id: usize,
}

impl CrashTree {
    /// Validates `tree` and flattens every call stack. Frames whose binary
    /// name contains `in_app_marker` are flagged as in-app.
    pub fn from_call_stack_tree(tree: &CallStackTree, in_app_marker: &str) -> Result<Self> {
        let tree = validate_call_stack_tree(tree)?;

        let threads = tree
            .call_stacks
            .iter()
            .enumerate()
            .map(|(id, call_stack)| Thread {
                id,
                stack_frames: flatten_call_stack(&call_stack.call_stack_root_frames, in_app_marker),
            })
            .collect();
        let crashed_thread_id = crashed_thread_index(&tree.call_stacks);

        Ok(Self {
            threads,
            crashed_thread_id,
        })
    }

    pub fn threads(&self) -> &[Thread] {
        &self.threads
    }

    pub fn crashed_thread_id(&self) -> usize {
        self.crashed_thread_id
    }

    pub fn crashed_thread(&self) -> Result<&Thread> {
        self.threads.get(self.crashed_thread_id).ok_or_else(|| {
            Error::IncompleteCrashTree(format!(
                "crashed thread {} is missing from {} threads",
                self.crashed_thread_id,
                self.threads.len()
            ))
        })
    }

    /// Raw address of the innermost frame of the crashed thread.
    ///
    /// MetricKit does not report the mach exception subcode, this address is
    /// what gets sent in its place.
    pub fn crashing_instruction_address(&self) -> Result<i64> {
        let thread = self.crashed_thread()?;
        thread
            .stack_frames
            .first()
            .map(|frame| frame.instruction_address)
            .ok_or_else(|| {
                Error::IncompleteCrashTree(format!("crashed thread {} has no frames", thread.id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{call_stack, call_stack_tree, frame_chain};

    #[test]
    fn test_thread_ids_follow_input_order() {
        let tree = call_stack_tree(vec![
            call_stack(frame_chain(&[("A", "LibA", 10, 1)]), false),
            call_stack(vec![], false),
            call_stack(frame_chain(&[("B", "LibB", 20, 2)]), false),
        ]);
        let crash_tree = CrashTree::from_call_stack_tree(&tree, "MonetizeSDK").unwrap();

        let ids: Vec<usize> = crash_tree.threads().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(crash_tree.threads()[0].stack_frames.len(), 1);
        assert!(crash_tree.threads()[1].stack_frames.is_empty());
        assert_eq!(crash_tree.threads()[2].stack_frames[0].binary.uuid, "B");
    }

    #[test]
    fn test_crashed_thread_selection() {
        let tree = call_stack_tree(vec![
            call_stack(frame_chain(&[("A", "LibA", 10, 1)]), false),
            call_stack(frame_chain(&[("B", "LibB", 20, 2)]), true),
            call_stack(frame_chain(&[("C", "LibC", 30, 3)]), false),
        ]);
        let crash_tree = CrashTree::from_call_stack_tree(&tree, "MonetizeSDK").unwrap();
        assert_eq!(crash_tree.crashed_thread_id(), 1);
        assert_eq!(crash_tree.crashed_thread().unwrap().id, 1);
        assert_eq!(crash_tree.crashing_instruction_address().unwrap(), 20);
    }

    #[test]
    fn test_crashed_thread_defaults_to_first() {
        let tree = call_stack_tree(vec![
            call_stack(frame_chain(&[("A", "LibA", 10, 1)]), false),
            call_stack(frame_chain(&[("B", "LibB", 20, 2)]), false),
            call_stack(frame_chain(&[("C", "LibC", 30, 3)]), false),
        ]);
        let crash_tree = CrashTree::from_call_stack_tree(&tree, "MonetizeSDK").unwrap();
        assert_eq!(crash_tree.crashed_thread_id(), 0);
    }

    #[test]
    fn test_crashing_address_is_innermost_raw_address() {
        let tree = call_stack_tree(vec![call_stack(
            frame_chain(&[("A", "Root", 1000, 100), ("B", "Leaf", 2000, 300)]),
            true,
        )]);
        let crash_tree = CrashTree::from_call_stack_tree(&tree, "MonetizeSDK").unwrap();
        assert_eq!(crash_tree.crashing_instruction_address().unwrap(), 2000);
    }

    #[test]
    fn test_crashed_thread_without_frames() {
        let tree = call_stack_tree(vec![call_stack(vec![], true)]);
        let crash_tree = CrashTree::from_call_stack_tree(&tree, "MonetizeSDK").unwrap();
        let err = crash_tree.crashing_instruction_address().unwrap_err();
        assert!(matches!(err, Error::IncompleteCrashTree(_)));
    }

    #[test]
    fn test_invalid_tree_is_rejected() {
        let mut tree = call_stack_tree(vec![call_stack(vec![], true)]);
        tree.call_stack_per_thread = false;
        let err = CrashTree::from_call_stack_tree(&tree, "MonetizeSDK").unwrap_err();
        assert!(matches!(err, Error::UnsupportedDiagnosticShape(_)));
    }
}
