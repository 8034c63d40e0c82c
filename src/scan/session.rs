use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex as StdMutex};
use strum_macros::Display;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::detector::{Detector, DetectorLease};
use super::errors::ScanError;
use super::synthetic;
use super::types::{CreditSummary, ScanTimings, SessionOutcome};
use crate::catalog::models::Product;
use crate::catalog::repository::ProductCatalog;
use crate::event::{EventBus, SessionEvent};
use crate::ledger::service::RewardLedger;

/// States of a scan session
///
/// Terminal states are absorbing: once a session is Settled, Cancelled or
/// Failed no further transition is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ScanState {
    Idle,
    Activating,
    Detecting,
    Detected,
    Resolving,
    Crediting,
    Settled,
    Cancelled,
    Failed,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScanState::Settled | ScanState::Cancelled | ScanState::Failed
        )
    }
}

/// How a barcode reached the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionTrigger {
    /// The detector decoded a real barcode
    Decoded(String),
    /// The fallback timer elapsed (or no detector was available)
    Fallback,
}

/// Single-assignment guard shared between the detection callback and the
/// fallback timer
///
/// Exactly one of the two triggers wins; whichever fires second finds the
/// slot empty and becomes a no-op. This is the safety net even if timer
/// cancellation is imperfect.
pub struct DetectionGate {
    slot: StdMutex<Option<oneshot::Sender<DetectionTrigger>>>,
}

impl DetectionGate {
    pub fn channel() -> (Arc<Self>, oneshot::Receiver<DetectionTrigger>) {
        let (tx, rx) = oneshot::channel();
        (
            Arc::new(Self {
                slot: StdMutex::new(Some(tx)),
            }),
            rx,
        )
    }

    /// Fires the gate; only the first call wins. Returns whether this call
    /// claimed the gate.
    pub fn fire(&self, trigger: DetectionTrigger) -> bool {
        let Some(tx) = self.slot.lock().unwrap().take() else {
            return false;
        };
        // A dropped receiver means the session already left Detecting; the
        // gate still counts as claimed so no later trigger acts.
        let _ = tx.send(trigger);
        true
    }
}

/// What a captured trigger resolves against
enum Resolution {
    Synthetic(Product),
    Lookup(String),
}

/// State machine coordinating manual-entry and camera-detection paths into
/// a single resolved-product credit
///
/// The session owns the detector lease for its lifetime and guarantees
/// release on every exit path, including abrupt teardown.
pub struct ScanSession {
    id: String,
    user_id: String,
    catalog: Arc<dyn ProductCatalog>,
    ledger: Arc<RewardLedger>,
    detector: Arc<dyn Detector>,
    event_bus: EventBus,
    timings: ScanTimings,
    state: StdMutex<ScanState>,
    cancel_flag: watch::Sender<bool>,
    lease: StdMutex<Option<DetectorLease>>,
    timer_tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl ScanSession {
    pub fn new(
        user_id: String,
        catalog: Arc<dyn ProductCatalog>,
        ledger: Arc<RewardLedger>,
        detector: Arc<dyn Detector>,
        event_bus: EventBus,
        timings: ScanTimings,
    ) -> Arc<Self> {
        let (cancel_flag, _) = watch::channel(false);
        Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            catalog,
            ledger,
            detector,
            event_bus,
            timings,
            state: StdMutex::new(ScanState::Idle),
            cancel_flag,
            lease: StdMutex::new(None),
            timer_tasks: StdMutex::new(Vec::new()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn state(&self) -> ScanState {
        *self.state.lock().unwrap()
    }

    /// Drives the camera path: acquire the detector, wait for the first of
    /// a real detection or the fallback timeout, resolve, credit
    #[instrument(name = "run_camera", skip(self), fields(session_id = %self.id, user_id = %self.user_id))]
    pub async fn run_camera(&self) -> SessionOutcome {
        if !self.transition(ScanState::Activating).await {
            return SessionOutcome::Cancelled;
        }

        let (gate, trigger_rx) = DetectionGate::channel();

        match self.detector.activate().await {
            Ok(activation) => {
                {
                    let mut lease = self.lease.lock().unwrap();
                    *lease = Some(DetectorLease::new(self.detector.clone(), activation.handle));
                }
                if !self.transition(ScanState::Detecting).await {
                    // Cancelled between activation and the transition
                    self.release_detector();
                    return SessionOutcome::Cancelled;
                }

                // Forward the at-most-one detection into the gate
                let detection_gate = gate.clone();
                let session_id = self.id.clone();
                let forward = tokio::spawn(async move {
                    if let Ok(barcode) = activation.detection.await {
                        if !detection_gate.fire(DetectionTrigger::Decoded(barcode)) {
                            debug!(session_id = %session_id, "Late detection ignored by gate");
                        }
                    }
                });

                // The fallback timer guarantees a reward when nothing decodes
                let fallback_gate = gate.clone();
                let session_id = self.id.clone();
                let timeout = self.timings.detection_timeout;
                let fallback = tokio::spawn(async move {
                    tokio::time::sleep(timeout).await;
                    if !fallback_gate.fire(DetectionTrigger::Fallback) {
                        debug!(session_id = %session_id, "Fallback timer lost to a real detection");
                    }
                });

                let mut timers = self.timer_tasks.lock().unwrap();
                timers.push(forward);
                timers.push(fallback);
            }
            Err(_unavailable) => {
                // No camera or permission: go straight to the demo fallback
                // rather than failing the session
                info!(session_id = %self.id, "Detector unavailable, using demo fallback");
                gate.fire(DetectionTrigger::Fallback);
            }
        }

        let trigger = tokio::select! {
            result = trigger_rx => match result {
                Ok(trigger) => trigger,
                Err(_) => return SessionOutcome::Cancelled,
            },
            _ = self.wait_cancelled() => return SessionOutcome::Cancelled,
        };

        // A trigger won; the camera is no longer needed and the losing
        // timer is moot
        self.abort_timers();
        self.release_detector();

        let pending = match trigger {
            DetectionTrigger::Decoded(barcode) => {
                debug!(session_id = %self.id, barcode = %barcode, "Barcode decoded");
                Resolution::Lookup(barcode)
            }
            DetectionTrigger::Fallback => {
                debug!(session_id = %self.id, "Detection timed out, fabricating demo product");
                Resolution::Synthetic(synthetic::demo_product())
            }
        };

        if !self.transition(ScanState::Detected).await {
            return SessionOutcome::Cancelled;
        }
        let (captured_barcode, fallback) = match &pending {
            Resolution::Lookup(code) => (code.clone(), false),
            Resolution::Synthetic(product) => (product.barcode.clone(), true),
        };
        self.event_bus
            .emit_to_session(
                &self.id,
                SessionEvent::DetectionCaptured {
                    session_id: self.id.clone(),
                    barcode: captured_barcode,
                    fallback,
                },
            )
            .await;

        match pending {
            Resolution::Synthetic(product) => {
                if !self.settle_wait().await {
                    return SessionOutcome::Cancelled;
                }
                if !self.transition(ScanState::Resolving).await {
                    return SessionOutcome::Cancelled;
                }
                self.emit_resolved(&product, true).await;
                self.finish_credit(product, true).await
            }
            Resolution::Lookup(barcode) => {
                // The catalog lookup runs while the scanned confirmation is
                // shown
                let (found, waited) = tokio::join!(
                    self.catalog.find_by_barcode(&barcode),
                    self.settle_wait()
                );
                if !waited {
                    return SessionOutcome::Cancelled;
                }
                if !self.transition(ScanState::Resolving).await {
                    return SessionOutcome::Cancelled;
                }
                match found {
                    Ok(Some(product)) => {
                        self.emit_resolved(&product, false).await;
                        self.finish_credit(product, false).await
                    }
                    Ok(None) => {
                        // Camera-sourced barcode with no catalog match still
                        // rewards via the demo fallback
                        info!(
                            session_id = %self.id,
                            barcode = %barcode,
                            "Decoded barcode not in catalog, fabricating demo product"
                        );
                        let product = synthetic::demo_product();
                        self.emit_resolved(&product, true).await;
                        self.finish_credit(product, true).await
                    }
                    Err(e) => self.finish_failed(ScanError::Catalog(e.to_string())).await,
                }
            }
        }
    }

    /// Drives the manual-entry path: the submitted barcode enters directly
    /// at Detected; an unknown barcode fails instead of falling back
    #[instrument(name = "run_manual", skip(self), fields(session_id = %self.id, user_id = %self.user_id))]
    pub async fn run_manual(&self, barcode: &str) -> SessionOutcome {
        if !self.transition(ScanState::Detected).await {
            return SessionOutcome::Cancelled;
        }
        self.event_bus
            .emit_to_session(
                &self.id,
                SessionEvent::DetectionCaptured {
                    session_id: self.id.clone(),
                    barcode: barcode.to_string(),
                    fallback: false,
                },
            )
            .await;

        let (found, waited) = tokio::join!(
            self.catalog.find_by_barcode(barcode),
            self.settle_wait()
        );
        if !waited {
            return SessionOutcome::Cancelled;
        }
        if !self.transition(ScanState::Resolving).await {
            return SessionOutcome::Cancelled;
        }

        match found {
            Ok(Some(product)) => {
                self.emit_resolved(&product, false).await;
                self.finish_credit(product, false).await
            }
            Ok(None) => {
                self.finish_failed(ScanError::ProductNotFound {
                    barcode: barcode.to_string(),
                })
                .await
            }
            Err(e) => self.finish_failed(ScanError::Catalog(e.to_string())).await,
        }
    }

    /// Cancels the session: releases the detector, discards pending timers
    ///
    /// Idempotent; cancelling an already-settled or already-cancelled
    /// session is a no-op.
    #[instrument(name = "cancel_session", skip(self), fields(session_id = %self.id))]
    pub async fn cancel(&self) {
        if !self.transition(ScanState::Cancelled).await {
            debug!(session_id = %self.id, "Cancel on finished session is a no-op");
            return;
        }

        self.cancel_flag.send_replace(true);
        self.release_detector();
        self.abort_timers();

        self.event_bus
            .emit_to_session(
                &self.id,
                SessionEvent::SessionCancelled {
                    session_id: self.id.clone(),
                },
            )
            .await;

        info!(session_id = %self.id, "Scan session cancelled");
    }

    /// Moves to the next state unless the session already reached a
    /// terminal state; returns whether the transition happened
    async fn transition(&self, next: ScanState) -> bool {
        let prev = {
            let mut state = self.state.lock().unwrap();
            if state.is_terminal() {
                return false;
            }
            let prev = *state;
            *state = next;
            prev
        };

        debug!(
            session_id = %self.id,
            from = %prev,
            to = %next,
            "Scan session state changed"
        );
        self.event_bus
            .emit_to_session(
                &self.id,
                SessionEvent::StateChanged {
                    session_id: self.id.clone(),
                    state: next,
                },
            )
            .await;
        true
    }

    async fn finish_credit(&self, product: Product, synthetic: bool) -> SessionOutcome {
        if !self.transition(ScanState::Crediting).await {
            return SessionOutcome::Cancelled;
        }

        match self.ledger.credit(&self.user_id, &product, synthetic).await {
            Ok(outcome) => {
                if !self.transition(ScanState::Settled).await {
                    // Cancelled mid-credit; the ledger mutation stands but
                    // the session reports its terminal state
                    return SessionOutcome::Cancelled;
                }

                self.event_bus
                    .emit_to_session(
                        &self.id,
                        SessionEvent::Credited {
                            session_id: self.id.clone(),
                            points_earned: outcome.points_earned,
                            eco_score: outcome.eco_score,
                            total_scans: outcome.total_scans,
                        },
                    )
                    .await;

                // Leave the scan view shortly after showing the new totals
                let bus = self.event_bus.clone();
                let session_id = self.id.clone();
                let delay = self.timings.exit_delay;
                let exit_timer = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    bus.emit_to_session(
                        &session_id,
                        SessionEvent::ExitRequested {
                            session_id: session_id.clone(),
                        },
                    )
                    .await;
                });
                self.timer_tasks.lock().unwrap().push(exit_timer);

                SessionOutcome::Settled(CreditSummary {
                    product_name: product.name,
                    barcode: product.barcode,
                    overall_score: product.overall_score,
                    synthetic,
                    points_earned: outcome.points_earned,
                    eco_score: outcome.eco_score,
                    total_scans: outcome.total_scans,
                })
            }
            Err(e) => self.finish_failed(ScanError::Ledger(e)).await,
        }
    }

    async fn finish_failed(&self, error: ScanError) -> SessionOutcome {
        warn!(session_id = %self.id, error = %error, "Scan session failed");
        self.release_detector();
        self.abort_timers();

        if self.transition(ScanState::Failed).await {
            self.event_bus
                .emit_to_session(
                    &self.id,
                    SessionEvent::ScanFailed {
                        session_id: self.id.clone(),
                        reason: error.to_string(),
                    },
                )
                .await;
        }

        SessionOutcome::Failed(error)
    }

    async fn emit_resolved(&self, product: &Product, synthetic: bool) {
        self.event_bus
            .emit_to_session(
                &self.id,
                SessionEvent::ProductResolved {
                    session_id: self.id.clone(),
                    name: product.name.clone(),
                    barcode: product.barcode.clone(),
                    overall_score: product.overall_score,
                    synthetic,
                },
            )
            .await;
    }

    /// Waits out the settle delay; returns false if the session was
    /// cancelled first
    async fn settle_wait(&self) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.timings.settle_delay) => true,
            _ = self.wait_cancelled() => false,
        }
    }

    async fn wait_cancelled(&self) {
        let mut rx = self.cancel_flag.subscribe();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // The sender lives in this session, so it cannot be dropped
                // while anyone is waiting; never resolve if it somehow is
                std::future::pending::<()>().await;
            }
        }
    }

    fn release_detector(&self) {
        if let Some(mut lease) = self.lease.lock().unwrap().take() {
            lease.release();
        }
    }

    fn abort_timers(&self) {
        let mut timers = self.timer_tasks.lock().unwrap();
        for handle in timers.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        // Abrupt teardown must not leak the device or leave timers running
        if let Ok(mut lease) = self.lease.lock() {
            if let Some(lease) = lease.as_mut() {
                lease.release();
            }
        }
        if let Ok(mut timers) = self.timer_tasks.lock() {
            for handle in timers.drain(..) {
                handle.abort();
            }
        }
    }
}
