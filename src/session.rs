use image::DynamicImage;
use log::{debug, info, warn};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::JoinHandle;
use anyhow::Result;

use crate::calibration::{Calibration, CalibrationManager, CalibrationProgress, CalibrationStatus};
use crate::detection::TrunkDetector;
use crate::error::CalibrationError;
use crate::models::{Detection, PixelPoint};

/// Input to a measurement session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A snapshot from the camera or video source
    Frame(DynamicImage),
    /// Start a two-point calibration against an object of known length
    BeginCalibration { reference_cm: f64 },
    /// A user-selected point in frame pixel space
    ReportPoint(PixelPoint),
    CancelCalibration,
    Shutdown,
}

/// Output of a measurement session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutput {
    Detection(Detection),
    CalibrationStarted { reference_cm: f64 },
    CalibrationProgress(CalibrationProgress),
    CalibrationFailed(CalibrationError),
}

/// Owns the detector and the calibration state for one logical session.
/// Events are handled one at a time, so pipeline runs never overlap.
pub struct MeasurementSession {
    detector: TrunkDetector,
    calibration: CalibrationManager,
    frames_seen: u64,
}

impl MeasurementSession {
    pub fn new(detector: TrunkDetector) -> Self {
        let calibration = CalibrationManager::new(detector.default_calibration());
        Self {
            detector,
            calibration,
            frames_seen: 0,
        }
    }

    /// Start from a known scale instead of the placeholder
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = CalibrationManager::new(calibration);
        self
    }

    /// Start from a two-point calibration measured ahead of time, before
    /// any frame is processed
    pub fn with_reference(
        self,
        first: PixelPoint,
        second: PixelPoint,
        reference_cm: f64,
    ) -> Result<Self, CalibrationError> {
        let calibration = Calibration::from_reference(first, second, reference_cm)?;
        info!("Calibrated: 1 pixel = {:.4} cm (reference {} cm)", calibration.cm_per_pixel, reference_cm);
        Ok(self.with_calibration(calibration))
    }

    pub fn calibration_status(&self) -> CalibrationStatus {
        self.calibration.status()
    }

    pub fn calibration(&self) -> &CalibrationManager {
        &self.calibration
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Handle a single event. `Shutdown` produces no output.
    pub fn handle(&mut self, event: SessionEvent) -> Option<SessionOutput> {
        match event {
            SessionEvent::Frame(frame) => {
                self.frames_seen += 1;
                let detection = self.detector.run_pipeline(frame, self.calibration.calibration());
                Some(SessionOutput::Detection(detection))
            }
            SessionEvent::BeginCalibration { reference_cm } => {
                if self.frames_seen == 0 {
                    return Some(SessionOutput::CalibrationFailed(CalibrationError::NoFrameSource));
                }
                match self.calibration.begin(reference_cm) {
                    Ok(()) => Some(SessionOutput::CalibrationStarted { reference_cm }),
                    Err(e) => Some(SessionOutput::CalibrationFailed(e)),
                }
            }
            SessionEvent::ReportPoint(point) => match self.calibration.report_point(point) {
                Ok(progress) => Some(SessionOutput::CalibrationProgress(progress)),
                Err(e) => Some(SessionOutput::CalibrationFailed(e)),
            },
            SessionEvent::CancelCalibration => {
                self.calibration.cancel();
                None
            }
            SessionEvent::Shutdown => None,
        }
    }

    /// Process events until `Shutdown` or until every sender is gone.
    ///
    /// Frames that queue up while a run is in progress are coalesced: only the
    /// newest waiting frame is measured. Calibration events are never dropped.
    pub fn run(mut self, events: Receiver<SessionEvent>, outputs: Sender<SessionOutput>) -> Result<Self> {
        let mut pending: Option<SessionEvent> = None;

        loop {
            let event = match pending.take() {
                Some(event) => event,
                None => match events.recv() {
                    Ok(event) => event,
                    Err(_) => break,
                },
            };

            let event = match event {
                SessionEvent::Frame(frame) => {
                    let (latest, next) = Self::latest_frame(frame, &events);
                    pending = next;
                    SessionEvent::Frame(latest)
                }
                other => other,
            };

            if matches!(event, SessionEvent::Shutdown) {
                info!("Session shutting down after {} frames", self.frames_seen);
                break;
            }

            if let Some(output) = self.handle(event) {
                if outputs.send(output).is_err() {
                    debug!("Output receiver dropped; stopping session");
                    break;
                }
            }
        }

        Ok(self)
    }

    /// Drain queued frames, returning the newest one and the first non-frame
    /// event found behind them.
    fn latest_frame(
        mut frame: DynamicImage,
        events: &Receiver<SessionEvent>,
    ) -> (DynamicImage, Option<SessionEvent>) {
        let mut skipped = 0;
        loop {
            match events.try_recv() {
                Ok(SessionEvent::Frame(newer)) => {
                    frame = newer;
                    skipped += 1;
                }
                Ok(other) => {
                    if skipped > 0 {
                        debug!("Skipped {} stale frames", skipped);
                    }
                    return (frame, Some(other));
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                    if skipped > 0 {
                        debug!("Skipped {} stale frames", skipped);
                    }
                    return (frame, None);
                }
            }
        }
    }

    /// Run the session loop on a worker thread
    pub fn spawn(self) -> SessionHandle {
        let (event_tx, event_rx) = mpsc::channel();
        let (output_tx, output_rx) = mpsc::channel();
        let worker = std::thread::spawn(move || self.run(event_rx, output_tx));

        SessionHandle {
            sender: event_tx,
            receiver: output_rx,
            worker: Some(worker),
        }
    }
}

/// Client side of a spawned session
pub struct SessionHandle {
    sender: Sender<SessionEvent>,
    receiver: Receiver<SessionOutput>,
    worker: Option<JoinHandle<Result<MeasurementSession>>>,
}

impl SessionHandle {
    pub fn send(&self, event: SessionEvent) -> Result<()> {
        self.sender.send(event)
            .map_err(|e| anyhow::anyhow!("Failed to send session event: {}", e))
    }

    /// Block until the session produces its next output
    pub fn recv(&self) -> Option<SessionOutput> {
        self.receiver.recv().ok()
    }

    pub fn try_recv(&self) -> Option<SessionOutput> {
        self.receiver.try_recv().ok()
    }

    /// Stop the worker and hand back the session with its calibration intact
    pub fn shutdown(mut self) -> Result<MeasurementSession> {
        // The worker may already have exited; a failed send is fine then.
        let _ = self.sender.send(SessionEvent::Shutdown);
        let worker = self.worker.take()
            .ok_or_else(|| anyhow::anyhow!("Session worker already joined"))?;
        match worker.join() {
            Ok(result) => result,
            Err(_) => {
                warn!("Session worker panicked");
                Err(anyhow::anyhow!("Session worker panicked"))
            }
        }
    }
}
