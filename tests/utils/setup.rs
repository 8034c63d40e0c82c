use std::sync::Arc;
use std::time::Duration;

use ecoscan::catalog::repository::InMemoryProductCatalog;
use ecoscan::catalog::Product;
use ecoscan::ledger::repository::{InMemoryProfileStore, InMemoryScanEventStore};
use ecoscan::ledger::{Profile, RewardLedger};
use ecoscan::scan::detector::Detector;
use ecoscan::scan::{ScanSession, ScanTimings};
use ecoscan::EventBus;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub catalog: Arc<InMemoryProductCatalog>,
    pub profiles: Arc<InMemoryProfileStore>,
    pub scans: Arc<InMemoryScanEventStore>,
    pub ledger: Arc<RewardLedger>,
    pub event_bus: EventBus,
    pub timings: ScanTimings,
}

impl TestSetup {
    /// Builds a scan session against this setup's stores
    pub fn session_for(&self, user_id: &str, detector: Arc<dyn Detector>) -> Arc<ScanSession> {
        ScanSession::new(
            user_id.to_string(),
            self.catalog.clone(),
            self.ledger.clone(),
            detector,
            self.event_bus.clone(),
            self.timings,
        )
    }
}

pub struct TestSetupBuilder {
    products: Vec<Product>,
    profiles: Vec<Profile>,
    timings: ScanTimings,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            products: vec![],
            profiles: vec![],
            timings: ScanTimings {
                detection_timeout: Duration::from_millis(60),
                settle_delay: Duration::from_millis(10),
                exit_delay: Duration::from_millis(10),
            },
        }
    }

    pub fn with_product(mut self, barcode: &str, name: &str, overall_score: i32) -> Self {
        self.products.push(Product::new(
            barcode.to_string(),
            name.to_string(),
            overall_score,
            70,
            75,
            true,
        ));
        self
    }

    pub fn with_profile(mut self, user_id: &str, eco_score: i64, total_scans: i64) -> Self {
        let mut profile = Profile::new(user_id.to_string(), Some(user_id.to_string()));
        profile.eco_score = eco_score;
        profile.total_scans = total_scans;
        self.profiles.push(profile);
        self
    }

    pub fn with_detection_timeout(mut self, timeout: Duration) -> Self {
        self.timings.detection_timeout = timeout;
        self
    }

    pub fn build(self) -> TestSetup {
        let catalog = Arc::new(InMemoryProductCatalog::with_products(self.products));
        let profiles = Arc::new(InMemoryProfileStore::with_profiles(self.profiles));
        let scans = Arc::new(InMemoryScanEventStore::new(catalog.clone()));
        let ledger = Arc::new(RewardLedger::new(profiles.clone(), scans.clone()));

        TestSetup {
            catalog,
            profiles,
            scans,
            ledger,
            event_bus: EventBus::new(),
            timings: self.timings,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
