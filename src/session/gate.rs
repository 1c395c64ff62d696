/// Transition emitted by the speech gate for one VAD frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    None,
    Started,
    Ended,
}

/// Turns per-frame VAD decisions into speech start/end transitions.
///
/// Speech ends only after `hold_frames` consecutive non-speech frames,
/// so natural pauses inside a sentence do not split the segment.
pub struct SpeechGate {
    hold_frames: u32,
    is_speaking: bool,
    silence_frames: u32,
}

impl SpeechGate {
    pub fn new(hold_frames: u32) -> Self {
        Self {
            hold_frames,
            is_speaking: false,
            silence_frames: 0,
        }
    }

    pub fn is_speaking(&self) -> bool {
        self.is_speaking
    }

    /// Feed one frame's VAD decision
    pub fn update(&mut self, frame_is_speech: bool) -> GateTransition {
        if frame_is_speech {
            self.silence_frames = 0;
            if !self.is_speaking {
                self.is_speaking = true;
                return GateTransition::Started;
            }
        } else if self.is_speaking {
            self.silence_frames += 1;
            if self.silence_frames > self.hold_frames {
                self.is_speaking = false;
                self.silence_frames = 0;
                return GateTransition::Ended;
            }
        }
        GateTransition::None
    }

    pub fn reset(&mut self) {
        self.is_speaking = false;
        self.silence_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_start() {
        let mut gate = SpeechGate::new(2);
        assert_eq!(gate.update(true), GateTransition::Started);
        assert!(gate.is_speaking());
        assert_eq!(gate.update(true), GateTransition::None);
    }

    #[test]
    fn test_hold_bridges_short_pauses() {
        let mut gate = SpeechGate::new(2);
        gate.update(true);

        // Two silent frames: still within the hold
        assert_eq!(gate.update(false), GateTransition::None);
        assert_eq!(gate.update(false), GateTransition::None);
        assert!(gate.is_speaking());

        // Speech resumes, silence counter resets
        assert_eq!(gate.update(true), GateTransition::None);
        assert_eq!(gate.update(false), GateTransition::None);
        assert!(gate.is_speaking());
    }

    #[test]
    fn test_sustained_silence_ends_speech() {
        let mut gate = SpeechGate::new(2);
        gate.update(true);

        gate.update(false);
        gate.update(false);
        assert_eq!(gate.update(false), GateTransition::Ended);
        assert!(!gate.is_speaking());
    }

    #[test]
    fn test_silence_without_speech_is_quiet() {
        let mut gate = SpeechGate::new(2);
        for _ in 0..10 {
            assert_eq!(gate.update(false), GateTransition::None);
        }
    }

    #[test]
    fn test_reset() {
        let mut gate = SpeechGate::new(2);
        gate.update(true);
        gate.reset();
        assert!(!gate.is_speaking());
        assert_eq!(gate.update(true), GateTransition::Started);
    }
}
