use image::Rgb;
use rand::Rng;

/// The fixed label set, in display order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Surprise => "Surprise",
            Emotion::Neutral => "Neutral",
        }
    }

    pub fn color(&self) -> Rgb<u8> {
        let hex = match self {
            Emotion::Angry => 0xe53935,
            Emotion::Disgust => 0x8bc34a,
            Emotion::Fear => 0x607d8b,
            Emotion::Happy => 0xfbc02d,
            Emotion::Sad => 0x42a5f5,
            Emotion::Surprise => 0xff9800,
            Emotion::Neutral => 0x9e9e9e,
        };
        Rgb([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8])
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Emotion::Angry => "😠",
            Emotion::Disgust => "🤢",
            Emotion::Fear => "😨",
            Emotion::Happy => "😊",
            Emotion::Sad => "😢",
            Emotion::Surprise => "😲",
            Emotion::Neutral => "😐",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Emotion::Angry => "Shows irritation or hostility.",
            Emotion::Disgust => "Shows aversion or revulsion.",
            Emotion::Fear => "Indicates anxiety or being scared.",
            Emotion::Happy => "Indicates joy, pleasure, or contentment.",
            Emotion::Sad => "Reflects feelings of sorrow or unhappiness.",
            Emotion::Surprise => "Reflects astonishment or being startled.",
            Emotion::Neutral => "Lacks any strong emotional expression.",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Percentages per emotion, summing to 100.
///
/// Placeholder: these are drawn at random and carry no information about
/// the frame. No emotion model is wired in.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionScores {
    values: [f64; 7],
}

impl EmotionScores {
    pub fn synthesize<R: Rng>(rng: &mut R) -> EmotionScores {
        let mut values = [0f64; 7];
        for v in values.iter_mut() {
            *v = rng.random_range(0.0..=100.0);
        }
        EmotionScores::normalized(values)
    }

    /// Scale raw non-negative weights (in `Emotion::ALL` order) to
    /// percentages. An all-zero input is split evenly.
    pub fn normalized(raw: [f64; 7]) -> EmotionScores {
        let raw = raw.map(|v| if v.is_finite() { v.max(0.) } else { 0. });
        let total: f64 = raw.iter().sum();

        let values = if total > 0. {
            raw.map(|v| v / total * 100.)
        } else {
            [100. / 7.; 7]
        };

        let scores = EmotionScores { values };
        debug_assert!((scores.total() - 100.).abs() < 1e-6);
        scores
    }

    pub fn get(&self, emotion: Emotion) -> f64 {
        self.values[emotion.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL.iter().map(|e| (*e, self.get(*e)))
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Highest score first. Equal scores keep label order.
    pub fn ranked(&self) -> Vec<(Emotion, f64)> {
        let mut ranked: Vec<(Emotion, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// Highest scoring label. On a tie the label listed first wins.
    pub fn dominant(&self) -> Emotion {
        let mut best = Emotion::ALL[0];
        for (emotion, score) in self.iter() {
            if score > self.get(best) {
                best = emotion;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-6;

    #[test]
    fn test_synthesized_scores_sum_to_100() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let scores = EmotionScores::synthesize(&mut rng);
            assert_eq!(scores.iter().count(), 7);
            assert!(scores.iter().all(|(_, v)| v >= 0.));
            assert!((scores.total() - 100.).abs() < EPS);
        }
    }

    #[test]
    fn test_synthesize_varies() {
        let mut rng = StdRng::seed_from_u64(1);
        let a = EmotionScores::synthesize(&mut rng);
        let b = EmotionScores::synthesize(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_all_zero_splits_evenly() {
        let scores = EmotionScores::normalized([0.; 7]);
        for (_, v) in scores.iter() {
            assert!((v - 100. / 7.).abs() < EPS);
        }
        assert!((scores.total() - 100.).abs() < EPS);
    }

    #[test]
    fn test_negative_and_nan_weights_ignored() {
        let scores = EmotionScores::normalized([-4., f64::NAN, 0., 50., 0., 0., 50.]);
        assert_eq!(scores.get(Emotion::Angry), 0.);
        assert_eq!(scores.get(Emotion::Disgust), 0.);
        assert!((scores.get(Emotion::Happy) - 50.).abs() < EPS);
        assert!((scores.get(Emotion::Neutral) - 50.).abs() < EPS);
    }

    #[test]
    fn test_dominant_unique_max() {
        let scores = EmotionScores::normalized([1., 2., 3., 10., 2., 1., 1.]);
        assert_eq!(scores.dominant(), Emotion::Happy);

        let scores = EmotionScores::normalized([1., 2., 3., 4., 2., 1., 30.]);
        assert_eq!(scores.dominant(), Emotion::Neutral);
    }

    #[test]
    fn test_dominant_tie_takes_first_label() {
        let scores = EmotionScores::normalized([1., 5., 1., 1., 5., 1., 1.]);
        assert_eq!(scores.dominant(), Emotion::Disgust);
    }

    #[test]
    fn test_ranked_descending() {
        let scores = EmotionScores::normalized([3., 1., 4., 1., 5., 9., 2.]);
        let ranked = scores.ranked();

        assert_eq!(ranked[0].0, Emotion::Surprise);
        assert_eq!(ranked[1].0, Emotion::Sad);
        // equal weights keep label order
        assert_eq!(ranked[5].0, Emotion::Disgust);
        assert_eq!(ranked[6].0, Emotion::Happy);
        for pair in ranked.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Emotion::Angry.color(), Rgb([0xe5, 0x39, 0x35]));
        assert_eq!(Emotion::Neutral.color(), Rgb([0x9e, 0x9e, 0x9e]));
    }
}
