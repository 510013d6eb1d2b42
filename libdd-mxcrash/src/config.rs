// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::envelope::SentryDsn;

/// Binaries whose name contains this marker are reported as in-app.
pub const DEFAULT_IN_APP_MARKER: &str = "MonetizeSDK";

/// What the conversion needs to know about the destination and the
/// first-party code. Built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxCrashConfig {
    pub dsn: SentryDsn,
    /// An empty marker flags no frame as in-app.
    pub in_app_marker: String,
}

impl MxCrashConfig {
    pub fn new(dsn: SentryDsn) -> Self {
        Self {
            dsn,
            in_app_marker: DEFAULT_IN_APP_MARKER.to_string(),
        }
    }

    pub fn with_in_app_marker(mut self, in_app_marker: &str) -> Self {
        self.in_app_marker = in_app_marker.to_string();
        self
    }
}
