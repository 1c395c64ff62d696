use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use murmur::config::MurmurConfig;
use murmur::transcript::{TranscriptManager, TranscriptStore};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "murmur=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MurmurConfig::load_default()?;
    config.validate()?;

    let mode = std::env::args().nth(1).unwrap_or_else(|| "list".into());
    match mode.as_str() {
        "selftest" => {
            murmur::audio::run_pipeline_check()?;
        }
        "list" => {
            list_entries(&config)?;
        }
        "search" => {
            let keyword = std::env::args()
                .nth(2)
                .ok_or_else(|| anyhow::anyhow!("Usage: murmur search <keyword>"))?;
            search_entries(&config, &keyword)?;
        }
        #[cfg(feature = "audio-io")]
        "record" => {
            record(&config)?;
        }
        other => {
            anyhow::bail!(
                "Unknown mode '{}'. Available: list, search, selftest, record",
                other
            );
        }
    }

    Ok(())
}

fn open_transcripts(config: &MurmurConfig) -> Result<TranscriptManager> {
    let store = TranscriptStore::open(config.transcript_store_path())?;
    Ok(TranscriptManager::new(store))
}

fn list_entries(config: &MurmurConfig) -> Result<()> {
    let transcripts = open_transcripts(config)?;
    let entries = transcripts.all_entries();
    info!("{} journal entries in {:?}", entries.len(), config.data_dir);

    for entry in entries {
        let text = entry.reconstruct()?;
        println!(
            "{}  {}  v{}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.audio_path.display(),
            entry.latest_version_number(),
            text
        );
    }
    Ok(())
}

fn search_entries(config: &MurmurConfig, keyword: &str) -> Result<()> {
    let transcripts = open_transcripts(config)?;
    for entry in transcripts.search(keyword) {
        println!("{}  {}", entry.created_at.format("%Y-%m-%d %H:%M"), entry.reconstruct()?);
    }
    Ok(())
}

/// Record from the default microphone until Enter is pressed.
///
/// No speech engine ships with the crate, so the transcript stays
/// empty unless hypotheses are injected; levels, calibration, and
/// speech events are fully live.
#[cfg(feature = "audio-io")]
fn record(config: &MurmurConfig) -> Result<()> {
    use murmur::audio::MicCapture;
    use murmur::session::{self, ScriptedRecognizer, SessionEvent};
    use std::sync::Arc;
    use std::time::Duration;

    let store = TranscriptStore::open(config.transcript_store_path())?;
    let transcripts = Arc::new(TranscriptManager::new(store));

    let mut capture = MicCapture::new()?;
    let input_rate = capture.sample_rate();

    let recognizer = Box::new(ScriptedRecognizer::immediate(vec![]));
    let handle = session::spawn(config.clone(), input_rate, recognizer, transcripts)?;

    capture.start(handle.audio_sender())?;
    handle.start_recording()?;
    info!("Recording at {} Hz. Press Enter to stop.", input_rate);

    let stop_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let stop_flag_reader = Arc::clone(&stop_flag);
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        stop_flag_reader.store(true, std::sync::atomic::Ordering::Relaxed);
    });

    while !stop_flag.load(std::sync::atomic::Ordering::Relaxed) {
        if let Some(event) = handle.recv_event_timeout(Duration::from_millis(100)) {
            match event {
                SessionEvent::SpeechStarted => info!("Speech started"),
                SessionEvent::SpeechEnded => info!("Speech ended"),
                SessionEvent::Error(e) => tracing::warn!("{}", e),
                _ => {}
            }
        }
    }

    capture.stop();
    handle.stop_recording()?;
    handle.shutdown()?;
    info!("Recording saved under {:?}", config.recordings_dir());
    Ok(())
}
