use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

use super::errors::DetectorUnavailable;

/// Opaque handle identifying one detector activation
///
/// Returned by `activate` and passed back to `deactivate`; there is no
/// ambient or global handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorHandle(u64);

impl DetectorHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// A successful activation: the handle plus a channel delivering at most
/// one decoded barcode
pub struct Activation {
    pub handle: DetectorHandle,
    pub detection: oneshot::Receiver<String>,
}

/// Capability interface over an external optical barcode decoder
///
/// The decoding algorithm itself is out of scope; implementations only
/// promise that at most one successful detection is delivered per
/// activation and that `deactivate` is safe to call even if activation
/// failed or the handle was already released.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn activate(&self) -> Result<Activation, DetectorUnavailable>;

    fn deactivate(&self, handle: DetectorHandle);
}

/// Detector for hosts without a camera; activation always fails, which
/// routes scan sessions onto the demo fallback path
pub struct UnavailableDetector;

#[async_trait]
impl Detector for UnavailableDetector {
    async fn activate(&self) -> Result<Activation, DetectorUnavailable> {
        Err(DetectorUnavailable)
    }

    fn deactivate(&self, _handle: DetectorHandle) {}
}

/// Owned lease on an activated detector
///
/// The device is released exactly once: explicitly on the session's exit
/// paths, or implicitly on drop for abrupt teardown. A leaked activation
/// blocks later sessions from acquiring the device.
pub struct DetectorLease {
    detector: Arc<dyn Detector>,
    handle: Option<DetectorHandle>,
}

impl DetectorLease {
    pub fn new(detector: Arc<dyn Detector>, handle: DetectorHandle) -> Self {
        Self {
            detector,
            handle: Some(handle),
        }
    }

    /// Releases the underlying device; later calls are no-ops
    pub fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(handle = handle.id(), "Releasing detector");
            self.detector.deactivate(handle);
        }
    }
}

impl Drop for DetectorLease {
    fn drop(&mut self) {
        self.release();
    }
}
