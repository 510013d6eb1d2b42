// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

mod assembler;
mod schema;

pub use assembler::*;
pub use schema::*;
