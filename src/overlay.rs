use crate::analysis::{Analysis, Outcome};
use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::RgbImage;
use imageproc::drawing;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BOX_THICKNESS: u32 = 2;
const LABEL_OFFSET: i32 = 10;
const LABEL_SCALE: f32 = 24.;

const SYSTEM_FONTS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub struct LabelFont {
    font: FontVec,
    scale: PxScale,
}

impl LabelFont {
    pub fn load(path: &Path) -> Result<LabelFont> {
        let bytes = std::fs::read(path).with_context(|| format!("reading font {path:?}"))?;
        let font = FontVec::try_from_vec(bytes).with_context(|| format!("parsing font {path:?}"))?;
        Ok(LabelFont {
            font,
            scale: PxScale::from(LABEL_SCALE),
        })
    }

    /// Use `explicit` if given, otherwise the first system font that loads.
    /// `None` means labels are skipped and only boxes get drawn.
    pub fn discover(explicit: Option<&PathBuf>) -> Option<LabelFont> {
        if let Some(path) = explicit {
            match LabelFont::load(path) {
                Ok(font) => return Some(font),
                Err(e) => warn!("{e:#}"),
            }
        }

        for candidate in SYSTEM_FONTS {
            if let Ok(font) = LabelFont::load(Path::new(candidate)) {
                debug!("Using label font {candidate}");
                return Some(font);
            }
        }

        warn!("No usable font found, face labels will not be drawn");
        None
    }
}

/// Copy of `frame` with a box per face and the dominant label above it.
pub fn annotate(frame: &RgbImage, analysis: &Analysis, font: Option<&LabelFont>) -> RgbImage {
    let mut img = frame.clone();
    let color = analysis.dominant.color();
    let text = analysis.dominant.title();

    for face in &analysis.faces {
        // imageproc clips line drawing, so only the visible part of the border lands
        for inset in 0..BOX_THICKNESS {
            let Some(edge) = face.shrink(inset) else {
                break;
            };
            drawing::draw_hollow_rect_mut(&mut img, edge.into(), color);
        }

        let Some(visible) = face.clip(img.width(), img.height()) else {
            continue;
        };
        if let Some(font) = font {
            let (x, y) = visible.label_anchor(LABEL_OFFSET, font.scale.y as i32);
            drawing::draw_text_mut(&mut img, color, x, y, font.scale, &font.font, text);
        }
    }

    img
}

/// Frame to display for a detection outcome. Errors leave the frame as is.
pub fn render(frame: &RgbImage, outcome: &Outcome, font: Option<&LabelFont>) -> RgbImage {
    match outcome {
        Ok(analysis) => annotate(frame, analysis, font),
        Err(_) => frame.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisError;
    use crate::emotion::{Emotion, EmotionScores};
    use crate::shapes::rect::FaceBox;
    use image::Rgb;

    fn analysis(faces: Vec<FaceBox>) -> Analysis {
        let scores = EmotionScores::normalized([0., 0., 0., 0., 1., 0., 0.]);
        Analysis {
            faces,
            dominant: scores.dominant(),
            scores,
        }
    }

    fn frame() -> RgbImage {
        RgbImage::from_pixel(100, 80, Rgb([10, 10, 10]))
    }

    #[test]
    fn test_annotate_leaves_input_untouched() {
        let input = frame();
        let before = input.clone();

        let out = annotate(&input, &analysis(vec![FaceBox::new(20, 20, 30, 30)]), None);

        assert_eq!(input, before);
        assert_ne!(out, input);
    }

    #[test]
    fn test_box_drawn_in_dominant_color() {
        let out = annotate(&frame(), &analysis(vec![FaceBox::new(20, 20, 30, 30)]), None);
        let sad = Emotion::Sad.color();

        // outer and inner edge of the two pixel border
        assert_eq!(*out.get_pixel(20, 20), sad);
        assert_eq!(*out.get_pixel(21, 21), sad);
        assert_eq!(*out.get_pixel(49, 49), sad);
        // interior untouched
        assert_eq!(*out.get_pixel(35, 35), Rgb([10, 10, 10]));
    }

    #[test]
    fn test_box_partly_outside_frame() {
        // spans x -10..=29 and y 60..=99 on a 100x80 frame
        let out = annotate(&frame(), &analysis(vec![FaceBox::new(-10, 60, 40, 40)]), None);
        let sad = Emotion::Sad.color();
        let background = Rgb([10, 10, 10]);

        // top edge and right edge are visible
        assert_eq!(*out.get_pixel(0, 60), sad);
        assert_eq!(*out.get_pixel(29, 70), sad);
        assert_eq!(*out.get_pixel(28, 79), sad);
        // no border invented along the frame edges
        assert_eq!(*out.get_pixel(0, 70), background);
        assert_eq!(*out.get_pixel(5, 79), background);
    }

    #[test]
    fn test_box_outside_frame_draws_nothing() {
        let input = frame();
        let out = annotate(&input, &analysis(vec![FaceBox::new(150, 10, 20, 20)]), None);
        assert_eq!(out, input);
    }

    #[test]
    fn test_render_error_returns_copy() {
        let input = frame();
        let out = render(&input, &Err(AnalysisError::NoFace), None);
        assert_eq!(out, input);
    }

    #[test]
    fn test_missing_font_file() {
        assert!(LabelFont::load(Path::new("fonts/nope.ttf")).is_err());
    }
}
