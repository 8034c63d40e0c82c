use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::oneshot;

use ecoscan::scan::detector::{Activation, Detector, DetectorHandle};
use ecoscan::scan::DetectorUnavailable;

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Detector scripted to decode a fixed barcode after a delay, or to stay
/// silent forever, while tracking acquisition and release for assertions
pub struct ScriptedDetector {
    barcode: Option<String>,
    delay: Duration,
    next_id: AtomicU64,
    active: Mutex<Option<u64>>,
    releases: AtomicUsize,
}

impl ScriptedDetector {
    pub fn decoding(barcode: &str, delay: Duration) -> Self {
        Self {
            barcode: Some(barcode.to_string()),
            delay,
            next_id: AtomicU64::new(1),
            active: Mutex::new(None),
            releases: AtomicUsize::new(0),
        }
    }

    pub fn silent() -> Self {
        Self {
            barcode: None,
            delay: Duration::ZERO,
            next_id: AtomicU64::new(1),
            active: Mutex::new(None),
            releases: AtomicUsize::new(0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn activate(&self) -> Result<Activation, DetectorUnavailable> {
        let id = {
            let mut active = self.active.lock().unwrap();
            if active.is_some() {
                // The device is exclusively owned per session
                return Err(DetectorUnavailable);
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            *active = Some(id);
            id
        };

        let (tx, rx) = oneshot::channel();
        if let Some(barcode) = self.barcode.clone() {
            let delay = self.delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(barcode);
            });
        }

        Ok(Activation {
            handle: DetectorHandle::new(id),
            detection: rx,
        })
    }

    fn deactivate(&self, handle: DetectorHandle) {
        let mut active = self.active.lock().unwrap();
        if *active == Some(handle.id()) {
            *active = None;
        }
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}
