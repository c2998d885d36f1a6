//! Engine status record and device-loss notification.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::backend::{AdapterInfo, BackendKind, BackendLimits};

/// Capability surface consumed by status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// True while calls are answered by the accelerated backend.
    /// Once false it never becomes true again for this engine.
    pub accelerated: bool,
    /// Backend currently answering calls.
    pub backend: BackendKind,
    /// Adapter of the active backend.
    pub adapter: AdapterInfo,
    /// Limits of the active backend.
    pub limits: BackendLimits,
    /// Why acceleration is not in use, if it is not.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Default)]
struct LossState {
    lost: AtomicBool,
    reason: Mutex<Option<String>>,
}

/// Shared flag through which an accelerator reports device loss.
///
/// Cloned handles observe the same state. Reporting may happen from any
/// thread at any time; the engine picks it up on its next call.
#[derive(Debug, Clone, Default)]
pub struct DeviceLossHandle {
    state: Arc<LossState>,
}

impl DeviceLossHandle {
    /// Creates a handle in the "device healthy" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the device as lost. Only the first reason is kept.
    pub fn report(&self, reason: impl Into<String>) {
        if let Ok(mut slot) = self.state.reason.lock()
            && slot.is_none()
        {
            *slot = Some(reason.into());
        }
        self.state.lost.store(true, Ordering::Release);
    }

    /// True once loss has been reported.
    pub fn is_lost(&self) -> bool {
        self.state.lost.load(Ordering::Acquire)
    }

    /// The loss reason, if loss has been reported.
    pub fn lost_reason(&self) -> Option<String> {
        if !self.is_lost() {
            return None;
        }
        let reason = self
            .state
            .reason
            .lock()
            .ok()
            .and_then(|slot| slot.clone());
        Some(reason.unwrap_or_else(|| "device lost".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state_and_keep_first_reason() {
        let handle = DeviceLossHandle::new();
        let observer = handle.clone();
        assert!(!observer.is_lost());
        assert_eq!(observer.lost_reason(), None);

        handle.report("driver reset");
        handle.report("second report");
        assert!(observer.is_lost());
        assert_eq!(observer.lost_reason().as_deref(), Some("driver reset"));
    }

    #[test]
    fn report_from_another_thread() {
        let handle = DeviceLossHandle::new();
        let remote = handle.clone();
        std::thread::spawn(move || remote.report("hung"))
            .join()
            .unwrap();
        assert!(handle.is_lost());
    }
}
