use crate::analysis::{Analyzer, Outcome};
use crate::config::StreamSettings;
use crate::detect::FaceLocalizer;
use crate::overlay::{self, LabelFont};
use crate::session::Session;
use anyhow::Result;
use image::RgbImage;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, span, Level};

pub trait FrameSource {
    fn capture(&mut self) -> Result<RgbImage>;
}

/// Where the live stream is shown.
pub trait Presenter {
    fn show_frame(&mut self, frame: &RgbImage) -> Result<()>;
    fn show_outcome(&mut self, outcome: &Outcome, session: &Session) -> Result<()>;
    fn warn(&mut self, message: &str);
    fn fail(&mut self, message: &str);
    /// Polled once per tick, before capture.
    fn stop_requested(&mut self) -> bool;
}

pub trait Clock {
    fn elapsed(&self) -> Duration;
    fn sleep(&mut self, duration: Duration);
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn start() -> SystemClock {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    TimeBudget,
    CaptureFailed(String),
    UserStopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Running,
    Stopped(StopReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub reason: StopReason,
    pub ticks: u64,
    pub detections: usize,
}

/// Continuous capture: detect every `frame_process_rate` ticks, render every
/// tick with the latest detection, stop on the time budget, a capture
/// failure or a stop request. `source` is dropped before returning.
pub struct Stream<'a, L, R, P, C> {
    analyzer: Analyzer<L, R>,
    presenter: P,
    clock: C,
    settings: StreamSettings,
    font: Option<&'a LabelFont>,
    state: StreamState,
}

impl<'a, L, R, P, C> Stream<'a, L, R, P, C>
where
    L: FaceLocalizer,
    R: Rng,
    P: Presenter,
    C: Clock,
{
    pub fn new(
        analyzer: Analyzer<L, R>,
        presenter: P,
        clock: C,
        settings: StreamSettings,
        font: Option<&'a LabelFont>,
    ) -> Stream<'a, L, R, P, C> {
        Stream {
            analyzer,
            presenter,
            clock,
            settings,
            font,
            state: StreamState::Idle,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    #[cfg(test)]
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn run<S: FrameSource>(&mut self, mut source: S, session: &mut Session) -> StreamSummary {
        let rate = u64::from(self.settings.frame_process_rate.max(1));
        let limit = self.settings.time_limit;

        self.state = StreamState::Running;
        info!("Starting webcam");
        self.clock.sleep(self.settings.warmup);

        let mut tick: u64 = 0;
        let reason = loop {
            let span = span!(Level::INFO, "frame_loop_iter", tick);
            let _guard = span.enter();
            if self.clock.elapsed() > limit {
                self.presenter
                    .warn(&format!("Stopped after {} seconds.", limit.as_secs()));
                break StopReason::TimeBudget;
            }

            if self.presenter.stop_requested() {
                break StopReason::UserStopped;
            }

            let capture_span = span!(Level::DEBUG, "capture");
            let capture_guard = capture_span.enter();
            let frame = match source.capture() {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Failed to pull frame from webcam: {e:?}");
                    self.presenter.fail("Failed to access webcam");
                    break StopReason::CaptureFailed(format!("{e:#}"));
                }
            };
            drop(capture_guard);

            let detect_tick = tick % rate == 0;
            if detect_tick {
                let detect_span = span!(Level::DEBUG, "detect");
                let _detect_guard = detect_span.enter();
                session.record(self.analyzer.analyze(&frame));
            }
            tick += 1;

            let render_span = span!(Level::DEBUG, "render");
            let render_guard = render_span.enter();
            let shown = match session.latest_analysis() {
                Some(analysis) => overlay::annotate(&frame, analysis, self.font),
                None => frame,
            };
            if let Err(e) = self.presenter.show_frame(&shown) {
                error!("Failed to render frame: {e:?}");
            }
            if detect_tick {
                if let Some(outcome) = session.latest() {
                    if let Err(e) = self.presenter.show_outcome(outcome, session) {
                        error!("Failed to render results: {e:?}");
                    }
                }
            }
            drop(render_guard);

            self.clock.sleep(self.settings.tick_interval);
        };

        drop(source);
        debug!("Camera released after {tick} ticks");

        self.state = StreamState::Stopped(reason.clone());
        StreamSummary {
            reason,
            ticks: tick,
            detections: self.analyzer.detections(),
        }
    }
}
