pub mod challenge_step;
pub mod step_flow;

pub use challenge_step::ChallengeStep;
pub use step_flow::{StepFlow, StepOutcome};
