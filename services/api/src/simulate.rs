use crate::infra::build_backend;
use clap::Args;
use scorecard::config::AppConfig;
use scorecard::error::AppError;
use scorecard::telemetry;
use scorecard::workflows::audit::{
    AuditSession, QuestionBank, StepKind, SubmissionRecorder, Transition,
};
use std::sync::Arc;
use tracing::warn;

#[derive(Args, Debug, Default)]
pub(crate) struct SimulateArgs {
    /// Answer as `step=label`, in bank order. Repeat the flag per selection;
    /// a multi-select step takes one flag per ticked option.
    #[arg(long = "answer", value_name = "STEP=LABEL", value_parser = parse_answer)]
    pub(crate) answers: Vec<(String, String)>,
    /// Record the completed audit to the configured backend.
    #[arg(long)]
    pub(crate) submit: bool,
}

pub(crate) fn parse_answer(raw: &str) -> Result<(String, String), String> {
    let (step, label) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected STEP=LABEL, got '{raw}'"))?;
    let (step, label) = (step.trim(), label.trim());
    if step.is_empty() || label.is_empty() {
        return Err(format!("expected STEP=LABEL, got '{raw}'"));
    }
    Ok((step.to_string(), label.to_string()))
}

pub(crate) fn print_questions() -> Result<(), AppError> {
    let bank = QuestionBank::standard()?;
    println!("Automation scorecard ({} steps)", bank.len());
    for (index, step) in bank.steps().iter().enumerate() {
        println!(
            "\n{}. {} [{}] ({})",
            index + 1,
            step.title,
            step.id,
            step.kind.label()
        );
        println!("   {}", step.prompt);
        for option in &step.options {
            println!("   - {} ({:+})", option.label, option.weight);
        }
    }
    Ok(())
}

/// Walks a session through the standard bank. Steps the answers skip over
/// are advanced past unanswered, so the run always completes.
pub(crate) fn simulate(
    bank: Arc<QuestionBank>,
    answers: &[(String, String)],
) -> Result<AuditSession, AppError> {
    let mut session = AuditSession::new(Arc::clone(&bank));

    for (step_id, label) in answers {
        let target = bank
            .position(step_id)
            .ok_or_else(|| AppError::Usage(format!("unknown audit step '{step_id}'")))?;

        while !session.is_complete() && session.step_index() < target {
            session.advance();
        }

        if let Transition::Rejected(reason) = session.select(step_id, label) {
            return Err(AppError::Usage(format!(
                "cannot answer {step_id}={label}: {reason:?}"
            )));
        }
    }

    while !session.is_complete() {
        session.advance();
    }
    Ok(session)
}

pub(crate) async fn run_simulation(args: SimulateArgs) -> Result<(), AppError> {
    let SimulateArgs { answers, submit } = args;
    let bank = Arc::new(QuestionBank::standard()?);
    let mut session = simulate(Arc::clone(&bank), &answers)?;

    println!("Automation scorecard simulation");
    for step in bank.steps() {
        let chosen = match step.kind {
            StepKind::Intro => continue,
            StepKind::SingleSelect => session
                .answers()
                .single(&step.id)
                .unwrap_or("(unanswered)")
                .to_string(),
            StepKind::MultiSelect => {
                let labels = session.answers().multi(&step.id);
                if labels.is_empty() {
                    "(none)".to_string()
                } else {
                    labels.join(", ")
                }
            }
        };
        println!("- {}: {}", step.title, chosen);
    }

    let Some(result) = session.result() else {
        return Err(AppError::Usage("audit did not complete".to_string()));
    };
    println!(
        "\nEfficiency score: {}/100 (running total {})",
        result.display_score,
        session.running_score()
    );
    println!("Tier: {}", result.tier_label);
    println!("{}", result.message);

    if !submit {
        return Ok(());
    }

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let recorder = SubmissionRecorder::new(build_backend(&config.backend));
    if let Some(handle) = recorder.record(&mut session) {
        if let Err(err) = handle.await {
            warn!(error = %err, "audit submission task did not finish");
        }
    }
    Ok(())
}
