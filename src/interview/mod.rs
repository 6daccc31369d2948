pub mod detail;
pub mod form;
pub mod generator;

pub use detail::{load_interview_detail, AgentProps, DetailError, InterviewDetail};
pub use form::{
    FormEvent, GenerationRequest, InterviewGeneratorFormData, InterviewType, Level, Step,
    TransitionError, Wizard, WizardState,
};
pub use generator::{GenerationClient, GenerationError, HttpGenerationClient};
