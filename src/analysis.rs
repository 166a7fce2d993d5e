use crate::detect::FaceLocalizer;
use crate::emotion::{Emotion, EmotionScores};
use crate::shapes::rect::FaceBox;
use image::RgbImage;
use rand::Rng;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, span, Level};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("No faces detected in the image")]
    NoFace,
    #[error("{0}")]
    Unexpected(String),
}

/// Result of one detection call.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub faces: Vec<FaceBox>,
    pub scores: EmotionScores,
    pub dominant: Emotion,
}

pub type Outcome = Result<Analysis, AnalysisError>;

pub struct Analyzer<L, R> {
    localizer: L,
    rng: R,
    detections: usize,
}

impl<L: FaceLocalizer, R: Rng> Analyzer<L, R> {
    pub fn new(localizer: L, rng: R) -> Analyzer<L, R> {
        Analyzer {
            localizer,
            rng,
            detections: 0,
        }
    }

    /// Locate faces, then draw a fresh score set. Scores are only drawn when
    /// at least one face was found.
    pub fn analyze(&mut self, frame: &RgbImage) -> Outcome {
        let span = span!(Level::DEBUG, "analyze");
        let _guard = span.enter();
        let start = Instant::now();
        self.detections += 1;

        let faces: Vec<FaceBox> = self
            .localizer
            .locate(frame)
            .map_err(|e| AnalysisError::Unexpected(format!("{e:#}")))?
            .into_iter()
            .filter(|b| !b.is_degenerate())
            .collect();
        debug!("{}ms locating {} faces", start.elapsed().as_millis(), faces.len());

        if faces.is_empty() {
            return Err(AnalysisError::NoFace);
        }

        let scores = EmotionScores::synthesize(&mut self.rng);
        let dominant = scores.dominant();
        debug!("dominant emotion {}", dominant.label());

        Ok(Analysis {
            faces,
            scores,
            dominant,
        })
    }

    /// Number of detection calls made so far.
    pub fn detections(&self) -> usize {
        self.detections
    }
}
