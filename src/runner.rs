use crate::analyzer::{DetectionResult, GestureDetector, GestureState};
use crate::config::GestureCamConfig;
use crate::error::{GestureError, Result};
use crate::frame::FrameData;
use crate::output::DetectionWriter;
use crate::source::FrameSource;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};

/// Why the driving loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    SourceExhausted,
    FrameLimit,
    UserQuit,
}

/// Running totals over a detection session
#[derive(Debug, Clone, Default)]
pub struct RunnerStats {
    pub frames_processed: u64,
    pub moving_frames: u64,
    pub bodies_found: u64,
    pub gestures: u64,
    pub left_arm_up_frames: u64,
    pub right_arm_up_frames: u64,
    pub both_arms_up_frames: u64,
    pub last_frame_time: Option<SystemTime>,
}

impl RunnerStats {
    pub fn record(&mut self, result: &DetectionResult) {
        self.frames_processed += 1;
        self.last_frame_time = Some(result.timestamp);

        if !result.is_moving {
            return;
        }
        self.moving_frames += 1;

        if result.body.map_or(false, |b| b.is_body()) {
            self.bodies_found += 1;
        }

        if let Some(gesture) = result.recognized_gesture() {
            self.gestures += 1;
            if gesture.left_arm_up {
                self.left_arm_up_frames += 1;
            }
            if gesture.right_arm_up {
                self.right_arm_up_frames += 1;
            }
            if gesture.both_arms_up() {
                self.both_arms_up_frames += 1;
            }
        }
    }

    pub fn motion_ratio(&self) -> f64 {
        if self.frames_processed == 0 {
            0.0
        } else {
            self.moving_frames as f64 / self.frames_processed as f64
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Polls the terminal for a quit key while raw mode is held
struct KeyWatcher;

impl KeyWatcher {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        debug!("Raw mode enabled - press q or Esc to stop");
        Ok(Self)
    }

    /// Wait up to `timeout` for a key press; true when it asks to quit
    fn wait_for_quit(&self, timeout: Duration) -> bool {
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => true,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => true,
                    other => {
                        debug!("Key pressed: {:?}", other);
                        false
                    }
                },
                Ok(_) => false,
                Err(e) => {
                    warn!("Error reading keyboard event: {}", e);
                    false
                }
            },
            Ok(false) => false,
            Err(e) => {
                warn!("Error polling for keyboard events: {}", e);
                false
            }
        }
    }
}

impl Drop for KeyWatcher {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            error!("Failed to disable raw mode: {}", e);
        }
    }
}

/// Pulls frames from a source and feeds them through the detector one at a time
pub struct GestureRunner {
    config: GestureCamConfig,
    source: Box<dyn FrameSource>,
    writer: Option<DetectionWriter>,
    stats: RunnerStats,
}

impl GestureRunner {
    pub fn new(config: GestureCamConfig, source: Box<dyn FrameSource>) -> Result<Self> {
        let writer = DetectionWriter::from_config(&config.output)?;
        Ok(Self {
            config,
            source,
            writer,
            stats: RunnerStats::default(),
        })
    }

    /// Take the background frame and build a detector from it
    pub fn initialize(&mut self) -> Result<(GestureDetector, FrameData)> {
        let background = self.source.next_frame()?.ok_or_else(|| {
            GestureError::system(format!(
                "{} source ended before delivering a background frame",
                self.source.name()
            ))
        })?;

        info!(
            "Captured background frame {} ({}x{}) from {} source",
            background.id,
            background.width,
            background.height,
            self.source.name()
        );

        let detector = GestureDetector::new(self.config.detector, &background)?;
        Ok((detector, background))
    }

    /// Run until the source ends, the frame limit is hit or the user quits
    pub fn run(&mut self) -> Result<StopReason> {
        let (detector, background) = self.initialize()?;
        let key_watcher = if self.config.runner.interactive {
            Some(KeyWatcher::new()?)
        } else {
            None
        };
        let key_wait = Duration::from_millis(self.config.runner.key_wait_ms);

        let mut previous = background;
        let mut last_gesture: Option<GestureState> = None;

        let reason = loop {
            if let Some(limit) = self.config.runner.max_frames {
                if self.stats.frames_processed >= limit {
                    info!("Processed {} frames, stopping", limit);
                    break StopReason::FrameLimit;
                }
            }

            let current = match self.source.next_frame()? {
                Some(frame) => frame,
                None => {
                    info!("{} source exhausted", self.source.name());
                    break StopReason::SourceExhausted;
                }
            };

            let result = detector.detect(&current, &previous)?;
            self.stats.record(&result);

            let gesture = result.recognized_gesture();
            if gesture != last_gesture {
                match gesture {
                    Some(g) => info!(
                        "Frame {}: left arm {}, right arm {}",
                        result.frame_id,
                        arm_label(g.left_arm_up),
                        arm_label(g.right_arm_up)
                    ),
                    None => debug!("Frame {}: no gesture", result.frame_id),
                }
                last_gesture = gesture;
            }

            if let Some(writer) = self.writer.as_mut() {
                writer.write(&result)?;
            }

            // The frame just analyzed becomes the motion reference for the next one
            previous = current;

            if let Some(watcher) = &key_watcher {
                if watcher.wait_for_quit(key_wait) {
                    info!("Quit key pressed - stopping");
                    break StopReason::UserQuit;
                }
            }
        };

        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
        }

        info!(
            "Session finished ({:?}): {} frames, {} moving, {} bodies, {} gestures, {} both arms up",
            reason,
            self.stats.frames_processed,
            self.stats.moving_frames,
            self.stats.bodies_found,
            self.stats.gestures,
            self.stats.both_arms_up_frames
        );

        Ok(reason)
    }

    pub fn stats(&self) -> &RunnerStats {
        &self.stats
    }
}

fn arm_label(up: bool) -> &'static str {
    if up {
        "up"
    } else {
        "down"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Pose, SyntheticSource};

    fn test_config() -> GestureCamConfig {
        GestureCamConfig::default()
    }

    #[test]
    fn test_runs_until_source_exhausted() {
        let source = SyntheticSource::new(640, 480, 6);
        let mut runner = GestureRunner::new(test_config(), Box::new(source)).unwrap();

        let reason = runner.run().unwrap();
        assert_eq!(reason, StopReason::SourceExhausted);
        // the first frame is the background
        assert_eq!(runner.stats().frames_processed, 5);
        assert_eq!(runner.stats().moving_frames, 5);
        assert_eq!(runner.stats().gestures, 5);
    }

    #[test]
    fn test_frame_limit() {
        let mut config = test_config();
        config.runner.max_frames = Some(2);

        let source = SyntheticSource::new(640, 480, 10);
        let mut runner = GestureRunner::new(config, Box::new(source)).unwrap();

        assert_eq!(runner.run().unwrap(), StopReason::FrameLimit);
        assert_eq!(runner.stats().frames_processed, 2);
    }

    #[test]
    fn test_empty_source_fails() {
        let source = SyntheticSource::new(640, 480, 0);
        let mut runner = GestureRunner::new(test_config(), Box::new(source)).unwrap();
        assert!(runner.run().is_err());
    }

    #[test]
    fn test_repeated_pose_is_still() {
        let poses = vec![Pose::Empty, Pose::BothArmsUp, Pose::BothArmsUp];
        let source = SyntheticSource::with_poses(640, 480, poses);
        let mut runner = GestureRunner::new(test_config(), Box::new(source)).unwrap();

        runner.run().unwrap();
        let stats = runner.stats();
        assert_eq!(stats.frames_processed, 2);
        assert_eq!(stats.moving_frames, 1);
        assert_eq!(stats.both_arms_up_frames, 1);
        assert_eq!(stats.motion_ratio(), 0.5);
    }

    #[test]
    fn test_writes_output_for_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config();
        config.output.directory = Some(dir.path().to_string_lossy().into_owned());
        config.output.save_metadata = true;

        let source = SyntheticSource::new(640, 480, 4);
        let mut runner = GestureRunner::new(config, Box::new(source)).unwrap();
        runner.run().unwrap();

        for id in 1..4 {
            assert!(dir.path().join(format!("mask_{:06}.png", id)).exists());
        }
        let log = std::fs::read_to_string(dir.path().join("detections.jsonl")).unwrap();
        assert_eq!(log.lines().count(), 3);
    }

    #[test]
    fn test_stats_reset() {
        let mut stats = RunnerStats {
            frames_processed: 4,
            moving_frames: 2,
            ..Default::default()
        };
        stats.reset();
        assert_eq!(stats.frames_processed, 0);
        assert_eq!(stats.motion_ratio(), 0.0);
    }
}
