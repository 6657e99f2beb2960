//! Player lifecycle states and their transitions.

use super::widget::WidgetState;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerState {
    Uninitialized,
    Initializing,
    Ready,
    Playing,
    Paused,
    Buffering,
    Cued,
    Ended,
    Errored,
    /// Initialization timed out. Terminal.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    Start,
    WidgetReady,
    WidgetState(WidgetState),
    WidgetError,
    Command,
    InitTimeout,
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("{input:?} rejected in state {state:?}")]
pub struct Rejected {
    pub state: PlayerState,
    pub input: PlayerInput,
}

impl PlayerState {
    /// Ready or any state reached after it, except `Failed`.
    pub fn is_ready(&self) -> bool {
        !matches!(
            self,
            PlayerState::Uninitialized | PlayerState::Initializing | PlayerState::Failed
        )
    }

    pub fn apply(self, input: PlayerInput) -> Result<PlayerState, Rejected> {
        use PlayerInput as I;
        use PlayerState as S;

        let rejected = Rejected { state: self, input };
        match (self, input) {
            (S::Failed, _) => Err(rejected),
            (S::Uninitialized, I::Start) => Ok(S::Initializing),
            (S::Uninitialized | S::Initializing, I::WidgetReady) => Ok(S::Ready),
            (S::Initializing, I::InitTimeout) => Ok(S::Failed),
            (s, I::WidgetReady) if s.is_ready() => Ok(S::Ready),
            (s, I::WidgetState(state)) if s.is_ready() => Ok(match state {
                WidgetState::Unstarted => S::Ready,
                WidgetState::Ended => S::Ended,
                WidgetState::Playing => S::Playing,
                WidgetState::Paused => S::Paused,
                WidgetState::Buffering => S::Buffering,
                WidgetState::Cued => S::Cued,
            }),
            (s, I::WidgetError) if s.is_ready() => Ok(S::Errored),
            (s, I::Command | I::InitTimeout) if s.is_ready() => Ok(s),
            _ => Err(rejected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialization_path() {
        let state = PlayerState::Uninitialized.apply(PlayerInput::Start).unwrap();
        assert_eq!(state, PlayerState::Initializing);
        assert_eq!(state.apply(PlayerInput::WidgetReady), Ok(PlayerState::Ready));
        assert_eq!(state.apply(PlayerInput::InitTimeout), Ok(PlayerState::Failed));
    }

    #[test]
    fn commands_need_a_ready_player() {
        for state in [PlayerState::Uninitialized, PlayerState::Initializing, PlayerState::Failed] {
            assert_eq!(
                state.apply(PlayerInput::Command),
                Err(Rejected {
                    state,
                    input: PlayerInput::Command
                })
            );
        }
        assert_eq!(
            PlayerState::Playing.apply(PlayerInput::Command),
            Ok(PlayerState::Playing)
        );
    }

    #[test]
    fn widget_reports_drive_ready_states() {
        let state = PlayerState::Ready
            .apply(PlayerInput::WidgetState(WidgetState::Playing))
            .unwrap();
        assert_eq!(state, PlayerState::Playing);
        let state = state.apply(PlayerInput::WidgetState(WidgetState::Ended)).unwrap();
        assert_eq!(state, PlayerState::Ended);
        let state = state.apply(PlayerInput::WidgetError).unwrap();
        assert_eq!(state, PlayerState::Errored);
        assert!(state.is_ready());

        assert!(PlayerState::Initializing
            .apply(PlayerInput::WidgetState(WidgetState::Playing))
            .is_err());
    }

    #[test]
    fn failed_is_terminal() {
        assert!(PlayerState::Failed.apply(PlayerInput::WidgetReady).is_err());
        assert!(!PlayerState::Failed.is_ready());
    }
}
