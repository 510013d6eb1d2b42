// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use super::Thread;
use std::collections::BTreeSet;

/// Identity of a binary image loaded in the crashed process.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageDescriptor {
    pub uuid: String,
    pub image_address: i64,
}

/// Every image referenced by a frame of any thread, deduplicated by
/// `(uuid, image_address)`.
///
/// Iteration is ordered by that key, consumers must not rely on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageCatalog {
    images: BTreeSet<ImageDescriptor>,
}

impl ImageCatalog {
    pub fn from_threads(threads: &[Thread]) -> Self {
        let images = threads
            .iter()
            .flat_map(|thread| &thread.stack_frames)
            .map(|frame| ImageDescriptor {
                uuid: frame.binary.uuid.clone(),
                image_address: frame.image_address,
            })
            .collect();
        Self { images }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageDescriptor> {
        self.images.iter()
    }
}
