use crate::shapes::rect::FaceBox;
use anyhow::{Error, Result};
use image::RgbImage;
use rustface::{Detector, ImageData};
use std::path::Path;
use tracing::{span, trace, Level};

// Fixed cascade search parameters
const MIN_FACE_SIZE: u32 = 20;
const SCORE_THRESHOLD: f64 = 2.0;
const PYRAMID_SCALE_FACTOR: f32 = 0.8;
const SLIDE_WINDOW_STEP: u32 = 4;

/// Anything that can find faces in a color frame.
pub trait FaceLocalizer {
    fn locate(&mut self, frame: &RgbImage) -> Result<Vec<FaceBox>>;
}

/// Frontal face cascade (SeetaFace funnel-structured cascade via rustface).
pub struct CascadeLocalizer {
    detector: Box<dyn Detector>,
}

impl CascadeLocalizer {
    pub fn load(model_path: &Path) -> Result<CascadeLocalizer> {
        let path = model_path
            .to_str()
            .ok_or_else(|| Error::msg(format!("Invalid detector path {model_path:?}")))?;
        if !model_path.exists() {
            return Err(Error::msg(format!(
                "Face detector model not found at {path}"
            )));
        }

        let mut detector = rustface::create_detector(path)
            .map_err(|e| Error::msg(format!("Failed to load face detector: {e}")))?;
        detector.set_min_face_size(MIN_FACE_SIZE);
        detector.set_score_thresh(SCORE_THRESHOLD);
        detector.set_pyramid_scale_factor(PYRAMID_SCALE_FACTOR);
        detector.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        Ok(CascadeLocalizer { detector })
    }
}

impl FaceLocalizer for CascadeLocalizer {
    fn locate(&mut self, frame: &RgbImage) -> Result<Vec<FaceBox>> {
        let span = span!(Level::DEBUG, "cascade");
        let _guard = span.enter();

        if frame.width() < MIN_FACE_SIZE || frame.height() < MIN_FACE_SIZE {
            trace!("Frame {:?} smaller than the minimum face", frame.dimensions());
            return Ok(Vec::new());
        }

        let gray = image::imageops::grayscale(frame);
        let data = ImageData::new(gray.as_raw(), gray.width(), gray.height());

        let faces: Vec<FaceBox> = self
            .detector
            .detect(&data)
            .iter()
            .map(|f| {
                let b = f.bbox();
                FaceBox::new(b.x(), b.y(), b.width(), b.height())
            })
            .filter(|b| !b.is_degenerate())
            .collect();

        trace!("Detected {} faces", faces.len());

        Ok(faces)
    }
}
