//! The session task
//!
//! Owns the calibration session until it is done, then moves the baseline
//! into a normalizer and runs the animation loop on the same task.

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::animation::{AnimationLoop, ControlEvent, LoopSettings};
use crate::calibration::{CalibrationPhase, CalibrationSession};
use crate::config::Config;
use crate::error::Result;
use crate::features::FeatureExtractor;
use crate::normalize::Normalizer;
use crate::output::{Renderer, StatusSink};
use crate::tracking::{LandmarkSource, PoseSource};

/// Run calibration and then animation until shutdown.
///
/// Failing to load the configured model is fatal. Events other than
/// calibration advances that arrive during calibration are applied once the
/// loop starts.
pub async fn run_session<L, P, R, S>(
    mut landmarks: L,
    poses: P,
    mut renderer: R,
    mut status: S,
    config: &Config,
    mut events: mpsc::Receiver<ControlEvent>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()>
where
    L: LandmarkSource + Send,
    P: PoseSource + Send,
    R: Renderer + Send,
    S: StatusSink + Send,
{
    renderer.load_model(&config.animation.model).await?;

    let extractor = FeatureExtractor::default();
    let mut calibration = CalibrationSession::new(extractor.clone(), config.tracking.face_confidence);
    let mut deferred = Vec::new();

    status.phase(&CalibrationPhase::Idle.to_string());
    status.status(CalibrationPhase::Idle.prompt());

    while !calibration.is_done() {
        tokio::select! {
            event = events.recv() => match event {
                Some(ControlEvent::AdvanceCalibration) => {
                    calibration.advance(&mut landmarks, &mut status).await;
                }
                Some(ControlEvent::Shutdown) | None => {
                    info!("Stopped during calibration");
                    return Ok(());
                }
                Some(event) => {
                    debug!("Deferring {:?} until calibration is done", event);
                    deferred.push(event);
                }
            },
            _ = shutdown.recv() => {
                info!("Stopped during calibration");
                return Ok(());
            }
        }
    }

    let normalizer = Normalizer::new(calibration.finish()?, config.tracking.clamp)?;
    let mut animation = AnimationLoop::new(
        landmarks,
        poses,
        renderer,
        status,
        normalizer,
        extractor,
        LoopSettings::from_config(config),
    );

    for event in deferred {
        if animation.handle_event(event).await.is_break() {
            return Ok(());
        }
    }

    animation.run(events, shutdown).await;
    Ok(())
}
