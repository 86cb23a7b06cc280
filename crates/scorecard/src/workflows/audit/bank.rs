use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const INTRO_STEP: &str = "intro";
pub const TEAM_STEP: &str = "team";
pub const TOOLS_STEP: &str = "tools";
pub const MANUAL_STEP: &str = "manual";
pub const INTEGRATION_STEP: &str = "integration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Intro,
    SingleSelect,
    MultiSelect,
}

impl StepKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Intro => "Intro",
            Self::SingleSelect => "Single Select",
            Self::MultiSelect => "Multi Select",
        }
    }

    pub const fn takes_options(self) -> bool {
        !matches!(self, Self::Intro)
    }
}

/// Selectable answer; the label doubles as the stored answer value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOption {
    pub label: String,
    pub weight: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionStep {
    pub id: String,
    pub kind: StepKind,
    pub title: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<AuditOption>,
}

impl QuestionStep {
    pub fn intro(id: &str, title: &str, prompt: &str) -> Self {
        Self::with_options(id, StepKind::Intro, title, prompt, &[])
    }

    pub fn single_select(id: &str, title: &str, prompt: &str, options: &[(&str, i32)]) -> Self {
        Self::with_options(id, StepKind::SingleSelect, title, prompt, options)
    }

    pub fn multi_select(id: &str, title: &str, prompt: &str, options: &[(&str, i32)]) -> Self {
        Self::with_options(id, StepKind::MultiSelect, title, prompt, options)
    }

    fn with_options(
        id: &str,
        kind: StepKind,
        title: &str,
        prompt: &str,
        options: &[(&str, i32)],
    ) -> Self {
        Self {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            prompt: prompt.to_string(),
            options: options
                .iter()
                .map(|(label, weight)| AuditOption {
                    label: (*label).to_string(),
                    weight: *weight,
                })
                .collect(),
        }
    }

    pub fn option(&self, label: &str) -> Option<&AuditOption> {
        self.options.iter().find(|option| option.label == label)
    }

    pub fn weight_of(&self, label: &str) -> Option<i32> {
        self.option(label).map(|option| option.weight)
    }
}

/// Ordered, validated list of audit steps. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionBank {
    steps: Vec<QuestionStep>,
}

impl QuestionBank {
    pub fn new(steps: Vec<QuestionStep>) -> Result<Self, BankError> {
        if steps.is_empty() {
            return Err(BankError::Empty);
        }

        let mut seen_ids = HashSet::new();
        for (index, step) in steps.iter().enumerate() {
            if step.id.trim().is_empty() {
                return Err(BankError::EmptyStepId { index });
            }
            if !seen_ids.insert(step.id.as_str()) {
                return Err(BankError::DuplicateStepId(step.id.clone()));
            }

            match (step.kind.takes_options(), step.options.is_empty()) {
                (false, false) => return Err(BankError::IntroWithOptions(step.id.clone())),
                (true, true) => return Err(BankError::MissingOptions(step.id.clone())),
                _ => {}
            }

            let mut seen_labels = HashSet::new();
            for option in &step.options {
                if !seen_labels.insert(option.label.as_str()) {
                    return Err(BankError::DuplicateOption {
                        step: step.id.clone(),
                        label: option.label.clone(),
                    });
                }
            }
        }

        Ok(Self { steps })
    }

    /// The production scorecard: intro, team, tools, manual, integration.
    pub fn standard() -> Result<Self, BankError> {
        Self::new(vec![
            QuestionStep::intro(
                INTRO_STEP,
                "System Audit",
                "Let's evaluate your current operational efficiency.",
            ),
            QuestionStep::single_select(
                TEAM_STEP,
                "Team Structure",
                "How large is your team?",
                &[
                    ("Solo Founder", 10),
                    ("2-10 Employees", 20),
                    ("11-50 Employees", 30),
                    ("50+ Employees", 40),
                ],
            ),
            QuestionStep::multi_select(
                TOOLS_STEP,
                "Tech Stack",
                "Which tools do you currently use?",
                &[
                    ("CRM (HubSpot, Salesforce)", 15),
                    ("Project Mgmt (Notion, ClickUp)", 15),
                    ("Email Marketing (Mailchimp)", 15),
                    ("Spreadsheets (Excel/Sheets)", -10),
                ],
            ),
            QuestionStep::single_select(
                MANUAL_STEP,
                "Manual Workload",
                "How much time is spent on manual data entry?",
                &[
                    ("Less than 2 hours/week", 30),
                    ("2-10 hours/week", 10),
                    ("10-20 hours/week", -10),
                    ("20+ hours/week", -30),
                ],
            ),
            QuestionStep::single_select(
                INTEGRATION_STEP,
                "Integration Level",
                "Do your apps talk to each other?",
                &[
                    ("Yes, fully automated", 40),
                    ("Some Zapier/Make automations", 20),
                    ("No, we copy-paste data", -20),
                ],
            ),
        ])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Panics when `index` is out of range; callers only pass indices the
    /// session state machine produced.
    pub fn step_at(&self, index: usize) -> &QuestionStep {
        assert!(
            index < self.steps.len(),
            "step index {index} out of range for bank of {} steps",
            self.steps.len()
        );
        &self.steps[index]
    }

    pub fn steps(&self) -> &[QuestionStep] {
        &self.steps
    }

    pub fn step(&self, id: &str) -> Option<&QuestionStep> {
        self.steps.iter().find(|step| step.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BankError {
    #[error("question bank has no steps")]
    Empty,
    #[error("step at index {index} has an empty id")]
    EmptyStepId { index: usize },
    #[error("step id '{0}' appears more than once")]
    DuplicateStepId(String),
    #[error("step '{step}' lists option '{label}' more than once")]
    DuplicateOption { step: String, label: String },
    #[error("intro step '{0}' must not carry options")]
    IntroWithOptions(String),
    #[error("question step '{0}' has no options")]
    MissingOptions(String),
}
