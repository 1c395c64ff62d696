use crate::transcript::Hypothesis;
use crate::Result;

/// Seam for speech-to-text engines.
///
/// The session feeds 16 kHz mono audio in and polls hypotheses out.
/// Real engines (platform recognizers, remote services) live behind
/// this trait; the crate itself only ships a scripted implementation
/// for tests and offline development.
pub trait Recognizer: Send {
    /// Feed a chunk of prepared audio
    fn accept_audio(&mut self, samples: &[f32]) -> Result<()>;

    /// Take the next pending hypothesis, if any
    fn poll_hypothesis(&mut self) -> Option<Hypothesis>;

    /// The recording stopped; flush any trailing hypothesis
    fn finish(&mut self) -> Result<Option<Hypothesis>>;
}

/// Recognizer that replays a fixed hypothesis script.
///
/// Emits one queued hypothesis every `stride_samples` of audio, which
/// makes session tests deterministic without a speech model.
pub struct ScriptedRecognizer {
    script: std::collections::VecDeque<Hypothesis>,
    stride_samples: usize,
    samples_since_emit: usize,
}

impl ScriptedRecognizer {
    pub fn new(script: Vec<Hypothesis>, stride_samples: usize) -> Self {
        Self {
            script: script.into(),
            stride_samples,
            samples_since_emit: 0,
        }
    }

    /// Script with no audio gating: every poll yields the next line
    pub fn immediate(script: Vec<Hypothesis>) -> Self {
        Self::new(script, 0)
    }
}

impl Recognizer for ScriptedRecognizer {
    fn accept_audio(&mut self, samples: &[f32]) -> Result<()> {
        self.samples_since_emit += samples.len();
        Ok(())
    }

    fn poll_hypothesis(&mut self) -> Option<Hypothesis> {
        if self.script.is_empty() {
            return None;
        }
        if self.samples_since_emit >= self.stride_samples {
            self.samples_since_emit = 0;
            return self.script.pop_front();
        }
        None
    }

    fn finish(&mut self) -> Result<Option<Hypothesis>> {
        // Whatever remains collapses to its last line
        let last = self.script.drain(..).last();
        Ok(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_script() {
        let mut rec = ScriptedRecognizer::immediate(vec![
            Hypothesis::partial("hel"),
            Hypothesis::final_text("hello"),
        ]);

        let first = rec.poll_hypothesis().unwrap();
        assert!(!first.is_final);
        let second = rec.poll_hypothesis().unwrap();
        assert!(second.is_final);
        assert!(rec.poll_hypothesis().is_none());
    }

    #[test]
    fn test_stride_gating() {
        let mut rec = ScriptedRecognizer::new(vec![Hypothesis::final_text("hi")], 1000);

        assert!(rec.poll_hypothesis().is_none());
        rec.accept_audio(&[0.0; 600]).unwrap();
        assert!(rec.poll_hypothesis().is_none());
        rec.accept_audio(&[0.0; 600]).unwrap();
        assert!(rec.poll_hypothesis().is_some());
    }

    #[test]
    fn test_finish_flushes_last() {
        let mut rec = ScriptedRecognizer::new(
            vec![Hypothesis::partial("a"), Hypothesis::final_text("ab")],
            usize::MAX,
        );
        let last = rec.finish().unwrap().unwrap();
        assert_eq!(last.text, "ab");
        assert!(rec.poll_hypothesis().is_none());
    }
}
