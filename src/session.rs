use crate::analysis::{Analysis, Outcome};
use crate::config::Cosmetic;

/// Per-run view state, handed to every render call.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub cosmetic: Cosmetic,
    latest: Option<Outcome>,
}

impl Session {
    pub fn new(cosmetic: Cosmetic) -> Session {
        Session {
            cosmetic,
            latest: None,
        }
    }

    pub fn record(&mut self, outcome: Outcome) {
        self.latest = Some(outcome);
    }

    pub fn latest(&self) -> Option<&Outcome> {
        self.latest.as_ref()
    }

    /// Most recent detection, if it found a face.
    pub fn latest_analysis(&self) -> Option<&Analysis> {
        match self.latest {
            Some(Ok(ref analysis)) => Some(analysis),
            _ => None,
        }
    }

    /// Caption for the options that only change what is displayed.
    pub fn caption(&self) -> String {
        format!(
            "detector: {} · model: {} · confidence ≥ {:.1}",
            self.cosmetic.detector_backend, self.cosmetic.emotion_model, self.cosmetic.confidence
        )
    }
}
