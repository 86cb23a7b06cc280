use serde::Serialize;

use super::bank::{QuestionStep, StepKind};
use super::evaluation::AuditResult;
use super::session::{AnswerSet, AuditSession, SessionState, Transition};
use super::service::SessionId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub index: usize,
    pub id: String,
    pub kind: StepKind,
    pub title: String,
    pub prompt: String,
    pub options: Vec<OptionView>,
}

impl StepView {
    fn capture(index: usize, step: &QuestionStep, answers: &AnswerSet) -> Self {
        Self {
            index,
            id: step.id.clone(),
            kind: step.kind,
            title: step.title.clone(),
            prompt: step.prompt.clone(),
            options: step
                .options
                .iter()
                .map(|option| OptionView {
                    label: option.label.clone(),
                    selected: answers.is_selected(&step.id, &option.label),
                })
                .collect(),
        }
    }
}

/// Snapshot of a session returned after every operation.
#[derive(Debug, Clone, Serialize)]
pub struct AuditSessionView {
    pub session_id: SessionId,
    pub state: SessionState,
    pub step_index: usize,
    pub step_count: usize,
    pub progress_pct: u8,
    pub step: Option<StepView>,
    pub answers: AnswerSet,
    pub running_score: i32,
    pub display_score: u8,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AuditResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
}

impl AuditSessionView {
    pub fn capture(
        session_id: &SessionId,
        session: &AuditSession,
        transition: Option<Transition>,
    ) -> Self {
        let step_index = session.step_index();
        Self {
            session_id: session_id.clone(),
            state: session.state(),
            step_index,
            step_count: session.bank().len(),
            progress_pct: session.progress_pct(),
            step: session
                .current_step()
                .map(|step| StepView::capture(step_index, step, session.answers())),
            answers: session.answers().clone(),
            running_score: session.running_score(),
            display_score: session.display_score(),
            is_complete: session.is_complete(),
            result: session.result(),
            transition,
        }
    }
}
