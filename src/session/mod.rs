//! Capture session orchestration.
//!
//! Wires microphone audio through preprocessing, level metering, noise
//! calibration, and voice activity detection, and routes recognizer
//! hypotheses into the versioned transcript store. Everything runs on
//! one worker thread; the caller talks to it over channels.

pub mod gate;
pub mod recognizer;

pub use gate::{GateTransition, SpeechGate};
pub use recognizer::{Recognizer, ScriptedRecognizer};

use crate::audio::preprocessor::{normalize_peak, remove_dc_offset};
use crate::audio::resampler::MonoResampler;
use crate::audio::vad::SpeechDetector;
use crate::audio::RECOGNIZER_SAMPLE_RATE;
use crate::config::MurmurConfig;
use crate::level::{self, CalibratorParams, NoiseCalibrator};
use crate::recorder::RecordingWriter;
use crate::transcript::manager::SharedTranscriptManager;
use crate::transcript::Hypothesis;
use crate::{MurmurError, Result};
use chrono::Utc;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Commands accepted by the session worker
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Begin a new recording
    Start,

    /// Finish the current recording
    Stop,

    /// A hypothesis from an external recognizer (e.g. a remote
    /// service driven outside the session)
    Hypothesis(Hypothesis),

    /// Delete every journal entry
    ClearJournal,

    /// Shut the worker down
    Shutdown,
}

/// Events emitted by the session worker
#[derive(Debug, Clone)]
pub enum SessionEvent {
    RecordingStarted(PathBuf),

    RecordingStopped {
        path: PathBuf,
        duration_seconds: f64,
    },

    /// Baseline-adjusted level in [0, 1] for display
    Level(f64),

    SpeechStarted,
    SpeechEnded,

    /// Live text from a partial hypothesis
    PartialTranscript(String),

    /// A final hypothesis was committed as a transcript version
    VersionCommitted {
        audio_path: PathBuf,
        number: u64,
    },

    Error(String),

    Shutdown,
}

/// Handle for controlling a running session
pub struct SessionHandle {
    command_tx: Sender<SessionCommand>,
    event_rx: Receiver<SessionEvent>,
    audio_tx: Sender<Vec<f32>>,
    is_recording: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn send_command(&self, cmd: SessionCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| MurmurError::ChannelError(format!("Failed to send command: {}", e)))
    }

    pub fn start_recording(&self) -> Result<()> {
        self.send_command(SessionCommand::Start)
    }

    pub fn stop_recording(&self) -> Result<()> {
        self.send_command(SessionCommand::Stop)
    }

    /// Sender for feeding mono capture chunks into the session
    pub fn audio_sender(&self) -> Sender<Vec<f32>> {
        self.audio_tx.clone()
    }

    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::Relaxed)
    }

    /// Stop the worker and wait for it to exit
    pub fn shutdown(mut self) -> Result<()> {
        let _ = self.send_command(SessionCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| MurmurError::SessionError("Worker thread panicked".into()))?;
        }
        Ok(())
    }
}

/// Spawn the session worker.
///
/// `input_sample_rate` is the rate of the audio fed through
/// [`SessionHandle::audio_sender`]; capture code passes the device
/// rate, tests usually pass 16 kHz directly.
pub fn spawn(
    config: MurmurConfig,
    input_sample_rate: u32,
    recognizer: Box<dyn Recognizer>,
    transcripts: SharedTranscriptManager,
) -> Result<SessionHandle> {
    config.validate()?;

    let (command_tx, command_rx) = bounded(16);
    let (event_tx, event_rx) = bounded(256);
    let (audio_tx, audio_rx) = bounded(64);
    let is_recording = Arc::new(AtomicBool::new(false));

    let mut worker = SessionWorker::new(
        config,
        input_sample_rate,
        recognizer,
        transcripts,
        event_tx,
        Arc::clone(&is_recording),
    )?;

    let handle = thread::Builder::new()
        .name("murmur-session".into())
        .spawn(move || worker.run(command_rx, audio_rx))
        .map_err(|e| MurmurError::SessionError(format!("Failed to spawn worker: {}", e)))?;

    Ok(SessionHandle {
        command_tx,
        event_rx,
        audio_tx,
        is_recording,
        worker: Some(handle),
    })
}

struct SessionWorker {
    config: MurmurConfig,
    input_sample_rate: u32,
    recognizer: Box<dyn Recognizer>,
    transcripts: SharedTranscriptManager,
    event_tx: Sender<SessionEvent>,
    is_recording: Arc<AtomicBool>,

    vad: SpeechDetector,
    gate: SpeechGate,
    calibrator: NoiseCalibrator,
    resampler: Option<MonoResampler>,

    /// Prepared 16 kHz samples waiting to fill a VAD frame
    vad_pending: Vec<f32>,
    writer: Option<RecordingWriter>,
    /// Transcript key for the active recording; also set when WAV
    /// output is disabled
    current_path: Option<PathBuf>,
}

impl SessionWorker {
    fn new(
        config: MurmurConfig,
        input_sample_rate: u32,
        recognizer: Box<dyn Recognizer>,
        transcripts: SharedTranscriptManager,
        event_tx: Sender<SessionEvent>,
        is_recording: Arc<AtomicBool>,
    ) -> Result<Self> {
        let vad = SpeechDetector::new(RECOGNIZER_SAMPLE_RATE, config.vad_threshold)?;

        let frames_per_second = RECOGNIZER_SAMPLE_RATE as f32 / vad.chunk_size() as f32;
        let hold_frames = (config.speech_hold_seconds * frames_per_second).round() as u32;
        let gate = SpeechGate::new(hold_frames);

        let calibrator = NoiseCalibrator::with_state_file(
            CalibratorParams::default(),
            config.calibration_path(),
        )?;

        let resampler = if input_sample_rate != RECOGNIZER_SAMPLE_RATE {
            Some(MonoResampler::new(input_sample_rate, RECOGNIZER_SAMPLE_RATE)?)
        } else {
            None
        };

        Ok(Self {
            config,
            input_sample_rate,
            recognizer,
            transcripts,
            event_tx,
            is_recording,
            vad,
            gate,
            calibrator,
            resampler,
            vad_pending: Vec::new(),
            writer: None,
            current_path: None,
        })
    }

    fn run(&mut self, command_rx: Receiver<SessionCommand>, audio_rx: Receiver<Vec<f32>>) {
        info!("Session worker started");

        loop {
            select! {
                recv(command_rx) -> cmd => match cmd {
                    Ok(SessionCommand::Start) => {
                        if let Err(e) = self.handle_start() {
                            self.emit_error(e);
                        }
                    }
                    Ok(SessionCommand::Stop) => {
                        if let Err(e) = self.handle_stop() {
                            self.emit_error(e);
                        }
                    }
                    Ok(SessionCommand::Hypothesis(hypothesis)) => {
                        self.route_hypothesis(&hypothesis);
                    }
                    Ok(SessionCommand::ClearJournal) => {
                        if let Err(e) = self.transcripts.clear() {
                            self.emit_error(e);
                        }
                    }
                    Ok(SessionCommand::Shutdown) | Err(_) => {
                        if self.is_recording.load(Ordering::Relaxed) {
                            if let Err(e) = self.handle_stop() {
                                self.emit_error(e);
                            }
                        }
                        break;
                    }
                },
                recv(audio_rx) -> chunk => {
                    if let Ok(chunk) = chunk {
                        if self.is_recording.load(Ordering::Relaxed) {
                            if let Err(e) = self.process_chunk(&chunk) {
                                self.emit_error(e);
                            }
                        }
                    }
                },
            }
        }

        let _ = self.event_tx.send(SessionEvent::Shutdown);
        info!("Session worker stopped");
    }

    fn handle_start(&mut self) -> Result<()> {
        if self.is_recording.load(Ordering::Relaxed) {
            warn!("Recording already in progress");
            return Ok(());
        }

        let path = if self.config.write_recordings {
            let writer =
                RecordingWriter::create(&self.config.recordings_dir(), self.input_sample_rate)?;
            let path = writer.path().to_path_buf();
            self.writer = Some(writer);
            path
        } else {
            // No WAV output, but transcript entries still need a key
            self.config
                .recordings_dir()
                .join(format!("recording_{}.wav", Utc::now().timestamp_millis()))
        };

        self.vad.reset();
        self.gate.reset();
        self.vad_pending.clear();
        if let Some(resampler) = &mut self.resampler {
            resampler.reset();
        }

        self.current_path = Some(path.clone());
        self.is_recording.store(true, Ordering::Relaxed);
        let _ = self.event_tx.send(SessionEvent::RecordingStarted(path));
        Ok(())
    }

    fn handle_stop(&mut self) -> Result<()> {
        if !self.is_recording.load(Ordering::Relaxed) {
            return Ok(());
        }
        self.is_recording.store(false, Ordering::Relaxed);

        let duration_seconds = match self.writer.take() {
            Some(writer) => {
                let duration = writer.elapsed_seconds();
                writer.finalize()?;
                duration
            }
            None => 0.0,
        };

        // Flush whatever the recognizer still holds
        if let Some(hypothesis) = self.recognizer.finish()? {
            self.route_hypothesis(&hypothesis);
        }

        if self.gate.is_speaking() {
            self.gate.reset();
            self.calibrator.set_speech_detected(false);
            let _ = self.event_tx.send(SessionEvent::SpeechEnded);
        }

        if let Some(path) = self.current_path.take() {
            let _ = self.event_tx.send(SessionEvent::RecordingStopped {
                path,
                duration_seconds,
            });
        }
        Ok(())
    }

    fn process_chunk(&mut self, chunk: &[f32]) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }

        if let Some(writer) = &mut self.writer {
            writer.write(chunk)?;
        }

        // Meter on the raw chunk; the calibrator normalizes display
        let raw_level = level::normalized_level(chunk);
        let adjusted = self.calibrator.handle_level(raw_level)?;
        if self.event_tx.try_send(SessionEvent::Level(adjusted)).is_err() {
            debug!("Dropped level event");
        }

        // Condition for VAD and the recognizer
        let no_dc = remove_dc_offset(chunk);
        let resampled = match &mut self.resampler {
            Some(resampler) => resampler.resample(&no_dc)?,
            None => no_dc,
        };
        let prepared = normalize_peak(&resampled);

        self.recognizer.accept_audio(&prepared)?;
        self.drain_hypotheses();

        self.vad_pending.extend_from_slice(&prepared);
        let frame = self.vad.chunk_size();
        while self.vad_pending.len() >= frame {
            let frame_samples: Vec<f32> = self.vad_pending.drain(..frame).collect();
            let is_speech = self.vad.is_speech(&frame_samples)?;
            match self.gate.update(is_speech) {
                GateTransition::Started => {
                    self.calibrator.set_speech_detected(true);
                    let _ = self.event_tx.send(SessionEvent::SpeechStarted);
                }
                GateTransition::Ended => {
                    self.calibrator.set_speech_detected(false);
                    let _ = self.event_tx.send(SessionEvent::SpeechEnded);
                }
                GateTransition::None => {}
            }
        }

        Ok(())
    }

    fn drain_hypotheses(&mut self) {
        while let Some(hypothesis) = self.recognizer.poll_hypothesis() {
            self.route_hypothesis(&hypothesis);
        }
    }

    fn route_hypothesis(&mut self, hypothesis: &Hypothesis) {
        let path = match &self.current_path {
            Some(path) => path.clone(),
            None => {
                warn!("Hypothesis received outside a recording, ignoring");
                return;
            }
        };

        match self.transcripts.handle_hypothesis(&path, hypothesis) {
            Ok(Some(number)) => {
                let _ = self.event_tx.send(SessionEvent::VersionCommitted {
                    audio_path: path,
                    number,
                });
            }
            Ok(None) => {
                if !hypothesis.is_final && !hypothesis.text.trim().is_empty() {
                    let _ = self
                        .event_tx
                        .send(SessionEvent::PartialTranscript(hypothesis.text.clone()));
                }
            }
            Err(e) => self.emit_error(e),
        }
    }

    fn emit_error(&self, e: MurmurError) {
        warn!("Session error: {}", e);
        let _ = self.event_tx.send(SessionEvent::Error(e.to_string()));
    }
}
