mod reveal;
mod runner;
mod turn;

pub use reveal::{reveal, RevealSchedule, RevealSteps};
pub use runner::{run_turn, spawn_turn};
pub use turn::{Pipeline, TurnEvent, TurnId, TurnKind, TurnRequest};
