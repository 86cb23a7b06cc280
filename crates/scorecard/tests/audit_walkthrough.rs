use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scorecard::workflows::audit::{
    AuditSession, AuthContext, BackendError, Collection, DataBackend, QuestionBank, QuestionStep,
    RecordId, ScoreTier, SessionState, SubmissionRecorder, Transition,
};
use serde_json::{json, Value};

#[derive(Default)]
struct RecordingBackend {
    created: Mutex<Vec<(Collection, Value)>>,
}

impl RecordingBackend {
    fn created(&self) -> Vec<(Collection, Value)> {
        self.created.lock().expect("created mutex").clone()
    }
}

#[async_trait]
impl DataBackend for RecordingBackend {
    async fn create(&self, collection: Collection, record: Value) -> Result<RecordId, BackendError> {
        let mut guard = self.created.lock().expect("created mutex");
        guard.push((collection, record));
        Ok(RecordId(format!("audit-{}", guard.len())))
    }

    async fn list(
        &self,
        _collection: Collection,
        _caller: &AuthContext,
    ) -> Result<Vec<Value>, BackendError> {
        Ok(Vec::new())
    }

    async fn resolve_session(&self, _token: &str) -> Result<Option<AuthContext>, BackendError> {
        Ok(None)
    }
}

fn walkthrough_bank() -> Arc<QuestionBank> {
    Arc::new(
        QuestionBank::new(vec![
            QuestionStep::intro("intro", "System Audit", "Let's evaluate your operations."),
            QuestionStep::single_select(
                "team",
                "Team Structure",
                "How large is your team?",
                &[("Solo Founder", 10), ("2-10 Employees", 20)],
            ),
            QuestionStep::multi_select(
                "tools",
                "Tech Stack",
                "Which tools do you currently use?",
                &[("CRM", 15), ("Spreadsheets", -10)],
            ),
            QuestionStep::single_select(
                "manual",
                "Manual Workload",
                "How much time is spent on manual data entry?",
                &[("Less than 2 hours/week", 30), ("20+ hours/week", -30)],
            ),
        ])
        .expect("walkthrough bank is valid"),
    )
}

#[tokio::test]
async fn walkthrough_scores_and_persists_once() {
    let backend = Arc::new(RecordingBackend::default());
    let recorder = SubmissionRecorder::new(backend.clone());
    let mut session = AuditSession::new(walkthrough_bank());

    assert_eq!(session.advance(), Transition::Moved(1));
    assert_eq!(session.select("team", "2-10 Employees"), Transition::Moved(2));
    assert_eq!(session.running_score(), 20);
    assert_eq!(session.select("tools", "CRM"), Transition::Stayed);
    assert_eq!(session.running_score(), 35);
    assert_eq!(session.select("tools", "Spreadsheets"), Transition::Stayed);
    assert_eq!(session.running_score(), 25);
    assert_eq!(session.state(), SessionState::AtStep(2));
    assert_eq!(session.advance(), Transition::Moved(3));
    assert_eq!(
        session.select("manual", "Less than 2 hours/week"),
        Transition::Completed
    );

    assert_eq!(session.running_score(), 55);
    assert_eq!(session.display_score(), 55);
    let result = session.result().expect("completed session has a result");
    assert_eq!(result.tier, ScoreTier::RoomForImprovement);
    assert_eq!(result.tier_label, "Room for Improvement");

    let handle = recorder.record(&mut session).expect("first render persists");
    for _ in 0..3 {
        assert!(recorder.record(&mut session).is_none());
    }
    handle.await.expect("submission task joins");

    let created = backend.created();
    assert_eq!(created.len(), 1);
    let (collection, record) = &created[0];
    assert_eq!(*collection, Collection::AuditSubmissions);
    assert_eq!(record["tech_stack"], json!(["CRM", "Spreadsheets"]));
    assert_eq!(record["team_size"], "2-10 Employees");
    assert_eq!(record["manual_hours"], "Less than 2 hours/week");
    assert_eq!(record["integration_level"], "unknown");
    assert_eq!(record["score"], 55);
    assert_eq!(
        record["answers"],
        json!({
            "team": "2-10 Employees",
            "tools": ["CRM", "Spreadsheets"],
            "manual": "Less than 2 hours/week",
        })
    );
    assert!(record["created_at"].is_string());
}

#[tokio::test]
async fn standard_bank_best_case_is_clamped_to_one_hundred() {
    let backend = Arc::new(RecordingBackend::default());
    let recorder = SubmissionRecorder::new(backend.clone());
    let mut session =
        AuditSession::new(Arc::new(QuestionBank::standard().expect("standard bank")));

    session.advance();
    session.select("team", "50+ Employees");
    session.select("tools", "CRM (HubSpot, Salesforce)");
    session.select("tools", "Project Mgmt (Notion, ClickUp)");
    session.select("tools", "Email Marketing (Mailchimp)");
    session.advance();
    session.select("manual", "Less than 2 hours/week");
    let transition = session.select("integration", "Yes, fully automated");

    assert_eq!(transition, Transition::Completed);
    assert_eq!(session.running_score(), 155);
    assert_eq!(session.display_score(), 100);
    assert_eq!(
        session.result().expect("complete").tier,
        ScoreTier::Optimized
    );

    recorder
        .record(&mut session)
        .expect("persists")
        .await
        .expect("joins");
    let created = backend.created();
    assert_eq!(created[0].1["score"], 100);
    assert_eq!(created[0].1["integration_level"], "Yes, fully automated");
}
