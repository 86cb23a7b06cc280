use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::bank::{QuestionBank, QuestionStep, StepKind};
use super::evaluation::{display_score, AuditResult};

/// Stored answer for a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multi(Vec<String>),
}

impl Answer {
    pub fn labels(&self) -> Vec<&str> {
        match self {
            Answer::Single(label) => vec![label.as_str()],
            Answer::Multi(labels) => labels.iter().map(String::as_str).collect(),
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        match self {
            Answer::Single(stored) => stored == label,
            Answer::Multi(labels) => labels.iter().any(|stored| stored == label),
        }
    }
}

/// Answers keyed by step id. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<String, Answer>);

impl AnswerSet {
    pub fn get(&self, step_id: &str) -> Option<&Answer> {
        self.0.get(step_id)
    }

    pub fn single(&self, step_id: &str) -> Option<&str> {
        match self.0.get(step_id) {
            Some(Answer::Single(label)) => Some(label.as_str()),
            _ => None,
        }
    }

    pub fn multi(&self, step_id: &str) -> &[String] {
        match self.0.get(step_id) {
            Some(Answer::Multi(labels)) => labels,
            _ => &[],
        }
    }

    pub fn is_selected(&self, step_id: &str, label: &str) -> bool {
        self.0
            .get(step_id)
            .map(|answer| answer.contains(label))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.0.iter().map(|(step_id, answer)| (step_id.as_str(), answer))
    }

    /// Stores `label` as the step's answer, returning the label it replaced.
    fn set_single(&mut self, step_id: &str, label: &str) -> Option<String> {
        match self
            .0
            .insert(step_id.to_string(), Answer::Single(label.to_string()))
        {
            Some(Answer::Single(previous)) => Some(previous),
            _ => None,
        }
    }

    /// Flips membership of `label`; returns `true` when it is now selected.
    /// An emptied selection removes the step entry entirely.
    fn toggle(&mut self, step_id: &str, label: &str) -> bool {
        let entry = self
            .0
            .entry(step_id.to_string())
            .or_insert_with(|| Answer::Multi(Vec::new()));

        let selected = if let Answer::Multi(labels) = &mut *entry {
            match labels.iter().position(|stored| stored == label) {
                Some(position) => {
                    labels.remove(position);
                    false
                }
                None => {
                    labels.push(label.to_string());
                    true
                }
            }
        } else {
            *entry = Answer::Multi(vec![label.to_string()]);
            true
        };

        if matches!(self.0.get(step_id), Some(Answer::Multi(labels)) if labels.is_empty()) {
            self.0.remove(step_id);
        }
        selected
    }

    /// Sum of weights of every stored label, looked up in `bank`. Labels or
    /// steps the bank does not know contribute nothing.
    pub fn score_against(&self, bank: &QuestionBank) -> i32 {
        self.0
            .iter()
            .filter_map(|(step_id, answer)| bank.step(step_id).map(|step| (step, answer)))
            .map(|(step, answer)| {
                answer
                    .labels()
                    .into_iter()
                    .filter_map(|label| step.weight_of(label))
                    .sum::<i32>()
            })
            .sum()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step", rename_all = "snake_case")]
pub enum SessionState {
    AtStep(usize),
    Completed,
}

/// Why an operation left the session untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    AlreadyComplete,
    NotComplete,
    NotCurrentStep,
    NotSelectable,
    UnknownOption,
    AtFirstStep,
}

/// Outcome of a session operation. `Rejected` never changes state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Moved(usize),
    Stayed,
    Completed,
    Rejected(RejectReason),
}

impl Transition {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Transition::Rejected(_))
    }
}

/// One user's pass through the question bank.
#[derive(Debug, Clone)]
pub struct AuditSession {
    bank: Arc<QuestionBank>,
    state: SessionState,
    answers: AnswerSet,
    running_score: i32,
    completion_claimed: bool,
}

impl AuditSession {
    pub fn new(bank: Arc<QuestionBank>) -> Self {
        Self {
            bank,
            state: SessionState::AtStep(0),
            answers: AnswerSet::default(),
            running_score: 0,
            completion_claimed: false,
        }
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Index of the step on screen; a completed session reports its last step.
    pub fn step_index(&self) -> usize {
        match self.state {
            SessionState::AtStep(index) => index,
            SessionState::Completed => self.bank.len() - 1,
        }
    }

    pub fn current_step(&self) -> Option<&QuestionStep> {
        match self.state {
            SessionState::AtStep(index) => Some(self.bank.step_at(index)),
            SessionState::Completed => None,
        }
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn running_score(&self) -> i32 {
        self.running_score
    }

    pub fn recomputed_score(&self) -> i32 {
        self.answers.score_against(&self.bank)
    }

    pub fn display_score(&self) -> u8 {
        display_score(self.running_score)
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Completed
    }

    pub fn progress_pct(&self) -> u8 {
        if self.is_complete() {
            return 100;
        }
        let pct = (self.step_index() + 1) * 100 / self.bank.len();
        pct.min(100) as u8
    }

    pub fn result(&self) -> Option<AuditResult> {
        self.is_complete()
            .then(|| AuditResult::from_running_score(self.running_score))
    }

    pub fn select(&mut self, step_id: &str, label: &str) -> Transition {
        let index = match self.state {
            SessionState::AtStep(index) => index,
            SessionState::Completed => {
                return Transition::Rejected(RejectReason::AlreadyComplete)
            }
        };

        let bank = Arc::clone(&self.bank);
        let step = bank.step_at(index);
        if step.id != step_id {
            return Transition::Rejected(RejectReason::NotCurrentStep);
        }
        if !step.kind.takes_options() {
            return Transition::Rejected(RejectReason::NotSelectable);
        }
        let Some(weight) = step.weight_of(label) else {
            return Transition::Rejected(RejectReason::UnknownOption);
        };

        match step.kind {
            StepKind::SingleSelect => {
                let previous = self.answers.set_single(step_id, label);
                if let Some(previous_weight) = previous.as_deref().and_then(|p| step.weight_of(p))
                {
                    self.running_score -= previous_weight;
                }
                self.running_score += weight;
                self.step_forward(index)
            }
            StepKind::MultiSelect => {
                if self.answers.toggle(step_id, label) {
                    self.running_score += weight;
                } else {
                    self.running_score -= weight;
                }
                Transition::Stayed
            }
            StepKind::Intro => Transition::Rejected(RejectReason::NotSelectable),
        }
    }

    pub fn advance(&mut self) -> Transition {
        match self.state {
            SessionState::AtStep(index) => self.step_forward(index),
            SessionState::Completed => Transition::Rejected(RejectReason::AlreadyComplete),
        }
    }

    /// Steps back without undoing any stored answer or score contribution.
    pub fn retreat(&mut self) -> Transition {
        match self.state {
            SessionState::AtStep(0) => Transition::Rejected(RejectReason::AtFirstStep),
            SessionState::AtStep(index) => {
                self.state = SessionState::AtStep(index - 1);
                Transition::Moved(index - 1)
            }
            SessionState::Completed => Transition::Rejected(RejectReason::AlreadyComplete),
        }
    }

    pub fn reset(&mut self) -> Transition {
        if !self.is_complete() {
            return Transition::Rejected(RejectReason::NotComplete);
        }
        self.state = SessionState::AtStep(0);
        self.answers = AnswerSet::default();
        self.running_score = 0;
        self.completion_claimed = false;
        Transition::Moved(0)
    }

    /// Returns `true` exactly once per completion.
    pub(crate) fn claim_completion(&mut self) -> bool {
        if self.is_complete() && !self.completion_claimed {
            self.completion_claimed = true;
            return true;
        }
        false
    }

    fn step_forward(&mut self, index: usize) -> Transition {
        if index + 1 < self.bank.len() {
            self.state = SessionState::AtStep(index + 1);
            Transition::Moved(index + 1)
        } else {
            self.state = SessionState::Completed;
            Transition::Completed
        }
    }
}
