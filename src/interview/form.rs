//! Interview generator wizard.
//!
//! Three editing steps followed by a submission:
//!
//! ```text
//! Step 1 (role, type) -> Step 2 (level, amount) -> Step 3 (techstack)
//!     -> Submitting -> Success
//!                   -> Step 3 with an error message
//! ```
//!
//! All transitions go through [`Wizard::dispatch`]. `Submitting` carries the
//! validated [`GenerationRequest`], so a submission with a missing field
//! cannot be constructed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_AMOUNT: u8 = 5;
pub const MIN_AMOUNT: u8 = 1;
pub const MAX_AMOUNT: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    Technical,
    Behavioral,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Entry,
    Mid,
    Senior,
}

/// Field values collected by the wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewGeneratorFormData {
    #[serde(rename = "type")]
    pub interview_type: Option<InterviewType>,
    pub role: String,
    pub level: Option<Level>,
    /// Comma-separated technologies
    pub techstack: String,
    pub amount: u8,
    pub userid: String,
}

impl InterviewGeneratorFormData {
    pub fn new(userid: impl Into<String>) -> Self {
        Self {
            interview_type: None,
            role: String::new(),
            level: None,
            techstack: String::new(),
            amount: DEFAULT_AMOUNT,
            userid: userid.into(),
        }
    }
}

/// Body of `POST /api/vapi/generate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    #[serde(rename = "type")]
    pub interview_type: InterviewType,
    pub role: String,
    pub level: Level,
    pub techstack: String,
    pub amount: u8,
    pub userid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    RoleAndType,
    LevelAndAmount,
    TechStack,
}

impl Step {
    pub fn number(&self) -> u8 {
        match self {
            Step::RoleAndType => 1,
            Step::LevelAndAmount => 2,
            Step::TechStack => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    Editing { step: Step, error: Option<String> },
    Submitting(GenerationRequest),
    Success,
}

impl WizardState {
    fn name(&self) -> &'static str {
        match self {
            WizardState::Editing { .. } => "editing",
            WizardState::Submitting(_) => "submitting",
            WizardState::Success => "success",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    SetRole(String),
    SetType(Option<InterviewType>),
    SetLevel(Option<Level>),
    /// Raw input; clamped to [MIN_AMOUNT, MAX_AMOUNT]
    SetAmount(i64),
    SetTechstack(String),
    Next,
    Back,
    Submit,
    Succeeded,
    Failed(String),
    /// The in-flight request was dropped before it settled
    Abandoned,
    /// "Generate Another" from the success view
    Reset,
}

impl FormEvent {
    fn name(&self) -> &'static str {
        match self {
            FormEvent::SetRole(_) => "set_role",
            FormEvent::SetType(_) => "set_type",
            FormEvent::SetLevel(_) => "set_level",
            FormEvent::SetAmount(_) => "set_amount",
            FormEvent::SetTechstack(_) => "set_techstack",
            FormEvent::Next => "next",
            FormEvent::Back => "back",
            FormEvent::Submit => "submit",
            FormEvent::Succeeded => "succeeded",
            FormEvent::Failed(_) => "failed",
            FormEvent::Abandoned => "abandoned",
            FormEvent::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("job role and interview type are required")]
    MissingRoleOrType,
    #[error("experience level is required")]
    MissingLevel,
    #[error("tech stack is required")]
    MissingTechstack,
    #[error("{event} is not allowed while {state}")]
    NotAllowed {
        event: &'static str,
        state: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wizard {
    data: InterviewGeneratorFormData,
    state: WizardState,
}

impl Wizard {
    pub fn new(userid: impl Into<String>) -> Self {
        Self {
            data: InterviewGeneratorFormData::new(userid),
            state: WizardState::Editing {
                step: Step::RoleAndType,
                error: None,
            },
        }
    }

    pub fn data(&self) -> &InterviewGeneratorFormData {
        &self.data
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> Option<Step> {
        match &self.state {
            WizardState::Editing { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            WizardState::Editing { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, WizardState::Submitting(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self.state, WizardState::Success)
    }

    /// Whether `Next` would be accepted on the current step
    pub fn can_advance(&self) -> bool {
        match self.step() {
            Some(Step::RoleAndType) => self.check_role_and_type().is_ok(),
            Some(Step::LevelAndAmount) => self.data.level.is_some(),
            _ => false,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.step() == Some(Step::TechStack) && self.validated_request().is_ok()
    }

    pub fn dispatch(&mut self, event: FormEvent) -> Result<(), TransitionError> {
        let not_allowed = TransitionError::NotAllowed {
            event: event.name(),
            state: self.state.name(),
        };

        let next = match (&self.state, event) {
            (WizardState::Editing { .. }, FormEvent::SetRole(role)) => {
                self.data.role = role;
                None
            }
            (WizardState::Editing { .. }, FormEvent::SetType(interview_type)) => {
                self.data.interview_type = interview_type;
                None
            }
            (WizardState::Editing { .. }, FormEvent::SetLevel(level)) => {
                self.data.level = level;
                None
            }
            (WizardState::Editing { .. }, FormEvent::SetAmount(amount)) => {
                self.data.amount = amount.clamp(MIN_AMOUNT as i64, MAX_AMOUNT as i64) as u8;
                None
            }
            (WizardState::Editing { .. }, FormEvent::SetTechstack(techstack)) => {
                self.data.techstack = techstack;
                None
            }
            (WizardState::Editing { step, error }, FormEvent::Next) => {
                let step = match step {
                    Step::RoleAndType => {
                        self.check_role_and_type()?;
                        Step::LevelAndAmount
                    }
                    Step::LevelAndAmount => {
                        self.data.level.ok_or(TransitionError::MissingLevel)?;
                        Step::TechStack
                    }
                    Step::TechStack => return Err(not_allowed),
                };
                Some(WizardState::Editing {
                    step,
                    error: error.clone(),
                })
            }
            (WizardState::Editing { step, error }, FormEvent::Back) => {
                let step = match step {
                    Step::RoleAndType => return Err(not_allowed),
                    Step::LevelAndAmount => Step::RoleAndType,
                    Step::TechStack => Step::LevelAndAmount,
                };
                Some(WizardState::Editing {
                    step,
                    error: error.clone(),
                })
            }
            (
                WizardState::Editing {
                    step: Step::TechStack,
                    ..
                },
                FormEvent::Submit,
            ) => Some(WizardState::Submitting(self.validated_request()?)),
            (WizardState::Submitting(_), FormEvent::Succeeded) => Some(WizardState::Success),
            (WizardState::Submitting(_), FormEvent::Failed(message)) => {
                Some(WizardState::Editing {
                    step: Step::TechStack,
                    error: Some(message),
                })
            }
            (WizardState::Submitting(_), FormEvent::Abandoned) => Some(WizardState::Editing {
                step: Step::TechStack,
                error: None,
            }),
            (WizardState::Success, FormEvent::Reset) => {
                self.data = InterviewGeneratorFormData::new(std::mem::take(&mut self.data.userid));
                Some(WizardState::Editing {
                    step: Step::RoleAndType,
                    error: None,
                })
            }
            _ => return Err(not_allowed),
        };

        if let Some(state) = next {
            self.state = state;
        }
        Ok(())
    }

    /// Enter `Submitting` and hand back the payload to send
    pub(crate) fn begin_submit(&mut self) -> Result<GenerationRequest, TransitionError> {
        self.dispatch(FormEvent::Submit)?;
        match &self.state {
            WizardState::Submitting(request) => Ok(request.clone()),
            other => Err(TransitionError::NotAllowed {
                event: "submit",
                state: other.name(),
            }),
        }
    }

    fn check_role_and_type(&self) -> Result<InterviewType, TransitionError> {
        if self.data.role.trim().is_empty() {
            return Err(TransitionError::MissingRoleOrType);
        }
        self.data
            .interview_type
            .ok_or(TransitionError::MissingRoleOrType)
    }

    fn validated_request(&self) -> Result<GenerationRequest, TransitionError> {
        let interview_type = self.check_role_and_type()?;
        let level = self.data.level.ok_or(TransitionError::MissingLevel)?;
        if self.data.techstack.trim().is_empty() {
            return Err(TransitionError::MissingTechstack);
        }
        Ok(GenerationRequest {
            interview_type,
            role: self.data.role.clone(),
            level,
            techstack: self.data.techstack.clone(),
            amount: self.data.amount,
            userid: self.data.userid.clone(),
        })
    }
}
