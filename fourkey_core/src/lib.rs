pub mod config;
pub mod gameplay;
pub mod input;
pub mod session;
pub mod time;

pub use config::{ConfigError, GameplayConfig, JudgementWindows};
pub use gameplay::judge::{JudgeMachine, JudgementEvent, NoteState};
pub use gameplay::position::PositionMapper;
pub use gameplay::score::Stats;
pub use gameplay::JudgementTier;
pub use session::{PlaySession, PlayState, SessionError, SharedSession};
