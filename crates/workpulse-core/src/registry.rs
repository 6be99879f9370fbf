// SPDX-FileCopyrightText: 2026 Workpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform registry mapping each platform to its adapter and formatter.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::WorkpulseError;
use crate::traits::{PlatformAdapter, ReportFormatter};
use crate::types::Platform;

/// Adapter and formatter registered for one platform.
#[derive(Clone)]
pub struct RegisteredPlatform {
    pub adapter: Arc<dyn PlatformAdapter>,
    pub formatter: Arc<dyn ReportFormatter>,
}

/// Built once at startup and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    entries: BTreeMap<Platform, RegisteredPlatform>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under the platform it reports. Replaces any
    /// previous registration for that platform.
    pub fn register(
        &mut self,
        adapter: Arc<dyn PlatformAdapter>,
        formatter: Arc<dyn ReportFormatter>,
    ) {
        let platform = adapter.platform();
        tracing::debug!(%platform, "registering platform adapter");
        self.entries
            .insert(platform, RegisteredPlatform { adapter, formatter });
    }

    pub fn get(&self, platform: Platform) -> Option<&RegisteredPlatform> {
        self.entries.get(&platform)
    }

    /// Like [`PlatformRegistry::get`], but an unregistered platform is an error.
    pub fn require(&self, platform: Platform) -> Result<&RegisteredPlatform, WorkpulseError> {
        self.get(platform)
            .ok_or(WorkpulseError::AdapterNotFound { platform })
    }

    pub fn adapter(&self, platform: Platform) -> Option<Arc<dyn PlatformAdapter>> {
        self.entries.get(&platform).map(|e| e.adapter.clone())
    }

    /// Registered platforms in stable order.
    pub fn platforms(&self) -> Vec<Platform> {
        self.entries.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl std::fmt::Debug for PlatformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}
