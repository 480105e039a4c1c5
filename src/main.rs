use anyhow::{Context, Result};
use audio_session::audio::AudioBackendConfig;
use audio_session::{
    AudioEvent, Config, EventSink, HeadlessAudioSession, HeadlessPermissions, MediaSource,
    NatsTranscriber, PlayRequest, PlaybackEngine, RecordingEngine, SessionMonitor,
    SimulatedBackend, Transcriber, UnavailableTranscriber, WavRecorderFactory,
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "audio-session")]
#[command(about = "Drive the playback and recording engines from the command line")]
struct Args {
    /// Config file (TOML); defaults apply when omitted
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play simulated media and print its events
    Play {
        /// Media URL
        #[arg(default_value = "https://example.com/episode.mp3")]
        url: String,

        /// Length of the simulated media in seconds
        #[arg(long, default_value = "30")]
        media_secs: u64,

        /// Playback rate
        #[arg(short, long, default_value = "1.0")]
        rate: f32,

        /// Fraction of the media to start from
        #[arg(short, long, default_value = "0.0")]
        start: f64,

        /// Player info cadence in milliseconds
        #[arg(long)]
        info_ms: Option<u64>,
    },
    /// Record a synthetic tone and transcribe it
    Record {
        /// Seconds to record
        #[arg(short, long, default_value = "5")]
        duration: u64,

        /// Metering cadence in milliseconds
        #[arg(long, default_value = "500")]
        metering_ms: u64,
    },
}

/// Prints every event as a JSON line.
struct JsonLines;

impl EventSink for JsonLines {
    fn notify(&self, event: AudioEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!("Failed to serialize event: {}", e),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let sink: Arc<dyn EventSink> = Arc::new(JsonLines);
    let session = Arc::new(HeadlessAudioSession::default());
    let monitor = SessionMonitor::new(session.clone(), session.clone());
    monitor.set_event_sink(&sink);
    monitor.route_changed();

    match args.command {
        Command::Play {
            url,
            media_secs,
            rate,
            start,
            info_ms,
        } => {
            let backend = Arc::new(SimulatedBackend::new(Duration::from_secs(media_secs)));
            let engine = PlaybackEngine::new(backend, session, cfg.playback.clone());
            engine.set_event_sink(&sink);
            if let Some(ms) = info_ms {
                engine.set_subscription_frequency(Duration::from_millis(ms));
            }

            let (ready_tx, ready_rx) = oneshot::channel();
            let request = PlayRequest::new(MediaSource::new(url))
                .with_rate(rate)
                .starting_at(start);
            engine.play(request, move |outcome| {
                let _ = ready_tx.send(outcome);
            });

            ready_rx.await.context("Playback was superseded")??;

            let remaining =
                media_secs as f64 * (1.0 - start.clamp(0.0, 1.0)) / rate.max(0.1) as f64;
            sleep(Duration::from_secs_f64(remaining) + Duration::from_millis(200)).await;
            engine.stop();
            info!("Playback done");
        }
        Command::Record {
            duration,
            metering_ms,
        } => {
            let transcriber: Arc<dyn Transcriber> = match &cfg.transcription.nats_url {
                Some(url) => match NatsTranscriber::connect(url).await {
                    Ok(nats) => Arc::new(nats),
                    Err(e) => {
                        warn!("Transcription disabled: {:#}", e);
                        Arc::new(UnavailableTranscriber)
                    }
                },
                None => Arc::new(UnavailableTranscriber),
            };

            let factory = Arc::new(WavRecorderFactory::tone(AudioBackendConfig::from(
                &cfg.recording,
            )));
            let engine = RecordingEngine::new(
                factory,
                Arc::new(HeadlessPermissions::granted()),
                session,
                transcriber,
                cfg.recording.clone(),
            );
            engine.set_event_sink(&sink);
            engine
                .set_subscription_frequency(Duration::from_millis(metering_ms))
                .await;

            engine.start_or_resume_recording().await?;
            sleep(Duration::from_secs(duration)).await;

            match engine.end_recording_session().await {
                Some(result) => println!("{}", serde_json::to_string(&result)?),
                None => warn!("No recording session was active"),
            }
        }
    }

    Ok(())
}
