// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Converts MetricKit `MXCrashDiagnostic` reports into Sentry events framed
//! as envelopes, ready to be posted to a Sentry project.

pub mod config;
pub mod crash_tree;
pub mod diagnostic;
pub mod envelope;
pub mod error;
pub mod event;
pub mod pipeline;
#[cfg(test)]
mod test_utils;

pub use error::{Error, Result};
