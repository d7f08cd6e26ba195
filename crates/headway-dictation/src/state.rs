//! Dictation session lifecycle states.

use std::fmt;

/// Phases a dictation session moves through. `Done` and `Error` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttState {
    /// Microphone is open and recording.
    Listening,
    /// Audio captured, waiting on the transcription service.
    Transcribing,
    /// Transcript received, injecting keystrokes.
    Typing,
    /// Session finished normally.
    Done,
    /// Session aborted with a failure.
    Error,
}

impl SttState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Whether this state may legally advance to `next`.
    pub fn can_transition_to(&self, next: SttState) -> bool {
        matches!(
            (self, next),
            (Self::Listening, Self::Transcribing)
                | (Self::Transcribing, Self::Typing)
                | (Self::Typing, Self::Done)
                | (Self::Listening, Self::Error)
                | (Self::Transcribing, Self::Error)
        )
    }
}

impl fmt::Display for SttState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Listening => "listening",
            Self::Transcribing => "transcribing",
            Self::Typing => "typing",
            Self::Done => "done",
            Self::Error => "error",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(SttState::Listening.can_transition_to(SttState::Transcribing));
        assert!(SttState::Transcribing.can_transition_to(SttState::Typing));
        assert!(SttState::Typing.can_transition_to(SttState::Done));
    }

    #[test]
    fn test_error_reachable_before_typing_only() {
        assert!(SttState::Listening.can_transition_to(SttState::Error));
        assert!(SttState::Transcribing.can_transition_to(SttState::Error));
        assert!(!SttState::Typing.can_transition_to(SttState::Error));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for next in [
            SttState::Listening,
            SttState::Transcribing,
            SttState::Typing,
            SttState::Done,
            SttState::Error,
        ] {
            assert!(!SttState::Done.can_transition_to(next));
            assert!(!SttState::Error.can_transition_to(next));
        }
        assert!(SttState::Done.is_terminal());
        assert!(SttState::Error.is_terminal());
        assert!(!SttState::Listening.is_terminal());
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(SttState::Listening.to_string(), "listening");
        assert_eq!(SttState::Error.to_string(), "error");
    }
}
