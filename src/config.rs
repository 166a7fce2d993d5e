use anyhow::{Error, Result};
use clap::{Args, Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct CmdArgs {
    /// Analyse a single JPEG/PNG instead of the webcam
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    #[command(flatten)]
    pub out: Out,

    /// Camera index
    #[arg(long, default_value = "0")]
    pub camera: u32,

    /// Requested camera frame rate
    #[arg(long, default_value = "30")]
    pub fps: u32,

    /// Detection confidence (only shown in the report)
    #[arg(long, default_value = "0.5", value_parser = parse_confidence)]
    pub confidence: f32,

    /// Detector backend label (only shown in the report)
    #[arg(long, value_enum, default_value_t = DetectorBackend::Retinaface)]
    pub detector_backend: DetectorBackend,

    /// Emotion model label (only shown in the report)
    #[arg(long, value_enum, default_value_t = EmotionModel::Default)]
    pub emotion_model: EmotionModel,

    /// Run detection every N webcam frames
    #[arg(short = 'r', long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=10))]
    pub frame_process_rate: u32,

    /// Webcam session length in seconds
    #[arg(long, default_value = "30")]
    pub time_limit: u64,

    /// Pause after each webcam frame (ms)
    #[arg(long, default_value = "30")]
    pub tick_interval_ms: u64,

    /// Pause before the first webcam frame (ms)
    #[arg(long, default_value = "1000")]
    pub warmup_ms: u64,

    /// Face detector model
    #[arg(long, value_name = "FILE", default_value = "models/seeta_fd_frontal_v1.0.bin")]
    pub detector_model: PathBuf,

    /// Font used for face labels
    #[arg(long, value_name = "FILE")]
    pub font: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct Out {
    /// Loopback device to write webcam frames to. Displays in window if unset
    #[arg(short, long, conflicts_with = "input")]
    pub device: Option<String>,

    /// Where the annotated upload is written
    #[arg(short, long, requires = "input")]
    pub output: Option<PathBuf>,
}

fn parse_confidence(s: &str) -> Result<f32> {
    let v: f32 = s.parse()?;
    if !(0.0..=1.0).contains(&v) {
        return Err(Error::msg(format!("{v} is not within 0.0..=1.0")));
    }
    Ok(v)
}

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum DetectorBackend {
    Retinaface,
    Opencv,
    Mediapipe,
    Ssd,
}

impl fmt::Display for DetectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DetectorBackend::Retinaface => "retinaface",
            DetectorBackend::Opencv => "opencv",
            DetectorBackend::Mediapipe => "mediapipe",
            DetectorBackend::Ssd => "ssd",
        };
        f.write_str(s)
    }
}

#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EmotionModel {
    Default,
    Fast,
    HighAccuracy,
}

impl fmt::Display for EmotionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EmotionModel::Default => "default",
            EmotionModel::Fast => "fast",
            EmotionModel::HighAccuracy => "high_accuracy",
        };
        f.write_str(s)
    }
}

/// Knobs that are displayed to the user but do not change detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cosmetic {
    pub confidence: f32,
    pub detector_backend: DetectorBackend,
    pub emotion_model: EmotionModel,
}

impl Default for Cosmetic {
    fn default() -> Cosmetic {
        Cosmetic {
            confidence: 0.5,
            detector_backend: DetectorBackend::Retinaface,
            emotion_model: EmotionModel::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamSettings {
    pub frame_process_rate: u32,
    pub time_limit: Duration,
    pub tick_interval: Duration,
    pub warmup: Duration,
}

impl Default for StreamSettings {
    fn default() -> StreamSettings {
        StreamSettings {
            frame_process_rate: 5,
            time_limit: Duration::from_secs(30),
            tick_interval: Duration::from_millis(30),
            warmup: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Upload { input: PathBuf, output: PathBuf },
    Webcam {
        camera: u32,
        fps: u32,
        device: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub mode: Mode,
    pub cosmetic: Cosmetic,
    pub stream: StreamSettings,
    pub detector_model: PathBuf,
    pub font: Option<PathBuf>,
}

impl TryFrom<CmdArgs> for Settings {
    type Error = Error;

    fn try_from(args: CmdArgs) -> Result<Settings> {
        if args.time_limit == 0 {
            return Err(Error::msg("--time-limit must be at least 1 second"));
        }

        let mode = match args.input {
            Some(input) => Mode::Upload {
                input,
                output: args.out.output.unwrap_or_else(|| "analyzed.png".into()),
            },
            None => Mode::Webcam {
                camera: args.camera,
                fps: args.fps,
                device: args.out.device,
            },
        };

        Ok(Settings {
            mode,
            cosmetic: Cosmetic {
                confidence: args.confidence,
                detector_backend: args.detector_backend,
                emotion_model: args.emotion_model,
            },
            stream: StreamSettings {
                frame_process_rate: args.frame_process_rate,
                time_limit: Duration::from_secs(args.time_limit),
                tick_interval: Duration::from_millis(args.tick_interval_ms),
                warmup: Duration::from_millis(args.warmup_ms),
            },
            detector_model: args.detector_model,
            font: args.font,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn settings(argv: &[&str]) -> Result<Settings> {
        let args = CmdArgs::try_parse_from(std::iter::once("emoscope").chain(argv.iter().copied()))?;
        Settings::try_from(args)
    }

    #[test]
    fn test_cli_definition() {
        CmdArgs::command().debug_assert();
    }

    #[test]
    fn test_defaults_to_webcam() -> Result<()> {
        let s = settings(&[])?;
        assert_eq!(
            s.mode,
            Mode::Webcam {
                camera: 0,
                fps: 30,
                device: None
            }
        );
        assert_eq!(s.stream, StreamSettings::default());
        assert_eq!(s.cosmetic, Cosmetic::default());
        Ok(())
    }

    #[test]
    fn test_upload_mode() -> Result<()> {
        let s = settings(&["-i", "face.jpg"])?;
        assert_eq!(
            s.mode,
            Mode::Upload {
                input: "face.jpg".into(),
                output: "analyzed.png".into()
            }
        );

        let s = settings(&["-i", "face.jpg", "-o", "out.png"])?;
        assert_eq!(
            s.mode,
            Mode::Upload {
                input: "face.jpg".into(),
                output: "out.png".into()
            }
        );
        Ok(())
    }

    #[test]
    fn test_output_requires_input() {
        assert!(settings(&["-o", "out.png"]).is_err());
    }

    #[test]
    fn test_frame_process_rate_range() {
        assert!(settings(&["-r", "0"]).is_err());
        assert!(settings(&["-r", "11"]).is_err());
        assert_eq!(settings(&["-r", "10"]).unwrap().stream.frame_process_rate, 10);
    }

    #[test]
    fn test_confidence_range() {
        assert!(settings(&["--confidence", "1.5"]).is_err());
        assert!(settings(&["--confidence", "abc"]).is_err());
        assert_eq!(settings(&["--confidence", "0.3"]).unwrap().cosmetic.confidence, 0.3);
    }

    #[test]
    fn test_cosmetic_enums() -> Result<()> {
        let s = settings(&["--detector-backend", "ssd", "--emotion-model", "high-accuracy"])?;
        assert_eq!(s.cosmetic.detector_backend, DetectorBackend::Ssd);
        assert_eq!(s.cosmetic.emotion_model, EmotionModel::HighAccuracy);
        assert_eq!(s.cosmetic.emotion_model.to_string(), "high_accuracy");
        Ok(())
    }

    #[test]
    fn test_zero_time_limit_rejected() {
        assert!(settings(&["--time-limit", "0"]).is_err());
    }
}
