// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Everything that can abandon the processing of a single crash diagnostic.
///
/// None of these are fatal to the process: each request is isolated and the
/// caller logs the error and drops the request.
#[derive(Debug, Error)]
pub enum Error {
    /// The request body does not decode against the diagnostic schema.
    #[error("malformed crash diagnostic: {0}")]
    MalformedInput(String),
    /// Multiple call stacks per thread, branching root frames, or no call
    /// stacks at all.
    #[error("unsupported diagnostic shape: {0}")]
    UnsupportedDiagnosticShape(&'static str),
    /// The flattened tree lacks data the event needs, e.g. a crashed thread
    /// without frames.
    #[error("incomplete crash tree: {0}")]
    IncompleteCrashTree(String),
    #[error("failed to serialize envelope: {0}")]
    SerializationFailure(#[from] serde_json::Error),
    #[error("failed to deliver envelope: {0}")]
    DeliveryFailure(String),
}

pub type Result<T> = std::result::Result<T, Error>;
