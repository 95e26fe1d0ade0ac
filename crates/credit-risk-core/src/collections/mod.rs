pub mod account;
pub mod stage;
pub mod state_machine;

pub use account::{CollectionsAccount, StageTransition, TransitionTrigger};
pub use stage::{target_stage, CollectionsStage};
pub use state_machine::{apply_payment, evaluate, request_transition};
