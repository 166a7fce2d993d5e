use crate::analysis::Outcome;
use crate::report::{Console, NoticeLevel};
use crate::session::Session;
use crate::stream::{FrameSource, Presenter};
use anyhow::{Error, Result};
use image::{EncodableLayout, RgbImage};
use tracing::{debug, error};

use std::io::Write;
use std::process::{Command, Stdio};

use nokhwa::{
    nokhwa_initialize,
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    Camera,
};

/// Exclusively owned webcam. The stream is stopped when this is dropped.
pub struct CameraSource {
    camera: Camera,
}

impl CameraSource {
    pub fn open(index: u32, fps: u32) -> Result<CameraSource> {
        nokhwa_initialize(|granted| {
            debug!("User said {}", granted);
        });

        let cameras = query(ApiBackend::Auto)?;
        cameras
            .iter()
            .for_each(|cam| debug!("Found camera: {:?}", cam));

        let mut camera = Camera::new(
            CameraIndex::Index(index),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate),
        )?;

        if let Err(e) = camera.set_frame_rate(fps) {
            debug!("Camera refused {fps} fps: {e:?}");
        }
        camera.open_stream()?;
        Ok(CameraSource { camera })
    }

    pub fn resolution(&self) -> (u32, u32) {
        let resolution = self.camera.resolution();
        (resolution.width(), resolution.height())
    }
}

impl FrameSource for CameraSource {
    fn capture(&mut self) -> Result<RgbImage> {
        let frame = self.camera.frame()?;
        let img: RgbImage = frame.decode_image::<RgbFormat>()?;
        Ok(img)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        match self.camera.stop_stream() {
            Err(e) => error!("Failed to release camera {e:?}"),
            Ok(_) => debug!("Camera released"),
        }
    }
}

pub struct OutputVideoStream {
    output_proc: std::process::Child,
    width: u32,
    height: u32,
}

impl Drop for OutputVideoStream {
    fn drop(&mut self) {
        match self.output_proc.kill() {
            Err(e) => error!("Failed to stop output process {e:?}"),
            Ok(_) => {}
        }
        let _ = self.output_proc.wait();
    }
}

impl OutputVideoStream {
    pub fn new(width: u32, height: u32, device: Option<String>) -> Result<Self> {
        let mut command = match device {
            Some(d) => {
                let mut command = Command::new("ffmpeg");
                command.args(&[
                    "-f",
                    "rawvideo",
                    "-pix_fmt",
                    "rgb24",
                    "-s",
                    &format!("{}x{}", width, height),
                    "-i",
                    "-",
                    "-map",
                    "0:v",
                    "-preset",
                    "fast",
                    "-vf",
                    "format=yuv420p",
                    "-f",
                    "v4l2",
                    &format!("/dev/{d}"),
                ]);
                command
            }
            None => {
                let mut command = Command::new("ffplay");
                command.args(&[
                    "-window_title",
                    "Live Webcam Feed",
                    "-f",
                    "rawvideo",
                    "-pixel_format",
                    "rgb24",
                    "-video_size",
                    &format!("{}x{}", width, height),
                    "-fflags",
                    "nobuffer",
                    "-flags",
                    "low_delay",
                    "-loglevel",
                    "error",
                    "-",
                ]);
                command
            }
        };
        let output_proc = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        Ok(Self {
            output_proc,
            width,
            height,
        })
    }

    pub fn write_frame(&mut self, img: &RgbImage) -> Result<()> {
        if img.dimensions() != (self.width, self.height) {
            return Err(Error::msg(format!(
                "frame is {:?}, output expects {}x{}",
                img.dimensions(),
                self.width,
                self.height
            )));
        }

        if let Some(stdin) = self.output_proc.stdin.as_mut() {
            stdin.write_all(img.as_bytes())?;
        }

        Ok(())
    }
}

/// Video window for frames, inline terminal panel for results.
pub struct TerminalPresenter {
    output: OutputVideoStream,
    console: Console,
}

impl TerminalPresenter {
    pub fn new(output: OutputVideoStream, mut console: Console) -> Result<TerminalPresenter> {
        console.notice(NoticeLevel::Info, "Real-time Emotion Detection (q, Esc or Ctrl-C to stop)")?;
        console.watch_keys()?;
        Ok(TerminalPresenter { output, console })
    }
}

impl Presenter for TerminalPresenter {
    fn show_frame(&mut self, frame: &RgbImage) -> Result<()> {
        self.output.write_frame(frame)
    }

    fn show_outcome(&mut self, outcome: &Outcome, session: &Session) -> Result<()> {
        self.console.show(outcome, session)
    }

    fn warn(&mut self, message: &str) {
        if let Err(e) = self.console.notice(NoticeLevel::Warning, message) {
            error!("{e:?}");
        }
    }

    fn fail(&mut self, message: &str) {
        if let Err(e) = self.console.notice(NoticeLevel::Error, message) {
            error!("{e:?}");
        }
    }

    fn stop_requested(&mut self) -> bool {
        self.console.stop_requested().unwrap_or_else(|e| {
            error!("Failed to read keyboard: {e:?}");
            false
        })
    }
}
