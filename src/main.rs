#![warn(unused_extern_crates)]
use analysis::Analyzer;
use anyhow::{Context, Result};
use clap::Parser;
use config::{CmdArgs, Mode, Settings, StreamSettings};
use detect::CascadeLocalizer;
use overlay::LabelFont;
use report::{Console, NoticeLevel};
use session::Session;
use std::io::{stdout, IsTerminal};
use std::path::Path;
use std::time::Instant;
use stream::{Stream, StopReason, SystemClock};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use video::{CameraSource, OutputVideoStream, TerminalPresenter};

mod analysis;
mod config;
mod detect;
mod emotion;
mod overlay;
mod report;
mod session;
mod shapes;
mod stream;
mod video;

fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let settings = Settings::try_from(CmdArgs::parse())?;
    warn!(
        "Confidence, detector backend and emotion model are display-only: {:?}",
        settings.cosmetic
    );

    let analyzer = Analyzer::new(
        CascadeLocalizer::load(&settings.detector_model)?,
        rand::rng(),
    );
    let font = LabelFont::discover(settings.font.as_ref());
    let mut session = Session::new(settings.cosmetic);

    match settings.mode {
        Mode::Upload { input, output } => {
            process_image(&input, &output, analyzer, font.as_ref(), &mut session)
        }
        Mode::Webcam {
            camera,
            fps,
            device,
        } => process_webcam(
            camera,
            fps,
            device,
            settings.stream,
            analyzer,
            font.as_ref(),
            &mut session,
        ),
    }
}

fn process_image(
    src: &Path,
    dest: &Path,
    mut analyzer: Analyzer<CascadeLocalizer, rand::rngs::ThreadRng>,
    font: Option<&LabelFont>,
    session: &mut Session,
) -> Result<()> {
    let span = span!(Level::DEBUG, "process_image");
    let _guard = span.enter();
    let start = Instant::now();

    let img = image::open(src)?.into_rgb8();
    let outcome = analyzer.analyze(&img);
    debug!("Took {:?}", start.elapsed());

    let shown = overlay::render(&img, &outcome, font);
    shown.save(dest)?;

    let caption = match outcome {
        Ok(_) => "Analyzed Image",
        Err(_) => "Uploaded Image",
    };
    let written = format!("{caption} written to {dest:?}");
    if stdout().is_terminal() {
        let mut console = Console::inline()?;
        console.notice(NoticeLevel::Info, &written)?;
        console.show(&outcome, session)?;
    } else {
        println!("{written}");
        println!("{}", report::plain_outcome(&outcome, session));
    }
    session.record(outcome);
    info!("Result at {:?}", dest);

    Ok(())
}

fn process_webcam(
    camera: u32,
    fps: u32,
    device: Option<String>,
    settings: StreamSettings,
    analyzer: Analyzer<CascadeLocalizer, rand::rngs::ThreadRng>,
    font: Option<&LabelFont>,
    session: &mut Session,
) -> Result<()> {
    let source = CameraSource::open(camera, fps).context("Failed to access webcam")?;
    let (width, height) = source.resolution();
    let output = OutputVideoStream::new(width, height, device)?;
    let presenter = TerminalPresenter::new(output, Console::inline()?)?;
    // the time budget covers the stream only, not device setup
    let clock = SystemClock::start();

    let mut stream = Stream::new(analyzer, presenter, clock, settings, font);
    let summary = stream.run(source, session);
    debug!("Stream state {:?}", stream.state());
    info!(
        "Webcam stopped after {} frames, {} detections: {:?}",
        summary.ticks, summary.detections, summary.reason
    );

    if let StopReason::CaptureFailed(e) = summary.reason {
        warn!("Capture failed: {e}");
    }

    Ok(())
}
