// ReportJobRunner: poll state machine, per-sub-report independence, cleanup on every path

mod common;

use common::*;
use insights_summary::definitions::top_talkers;
use insights_summary::error::{ClientError, JobError};
use insights_summary::models::{ReportDefinition, TimeWindow};
use insights_summary::runner::{PollPolicy, ReportJobRunner};
use serde_json::json;
use std::time::Duration;

fn definition() -> ReportDefinition {
    top_talkers("7", &TimeWindow::new("last 1 hour", "60"), 10)
}

#[tokio::test]
async fn completes_after_pending_states_with_one_payload_and_one_delete() {
    let client = ScriptedClient::new();
    let data = payload(vec![summary_row(1, "A", 10.0)]);
    client.accept(vec![SubReportPlan::completes_after(
        &["pending", "initializing", "executing"],
        data.clone(),
    )]);

    let runner = ReportJobRunner::new(&client, fast_policy());
    let run = runner.run(&definition()).await.unwrap();

    assert_eq!(run.job_id, "j1");
    assert_eq!(run.results, vec![data]);
    assert!(run.failures.is_empty());
    assert_eq!(client.status_calls(), 4);
    assert_eq!(client.data_calls(), 1);
    assert_eq!(client.deleted(), vec![("j1".to_string(), "i0".to_string())]);
}

#[tokio::test]
async fn any_unrecognised_state_is_terminal_success() {
    let client = ScriptedClient::new();
    client.accept(vec![SubReportPlan::with_states(
        &["executing", "finished_with_warnings"],
        payload(vec![]),
    )]);

    let runner = ReportJobRunner::new(&client, fast_policy());
    let run = runner.run(&definition()).await.unwrap();

    assert_eq!(run.results.len(), 1);
    assert_eq!(client.status_calls(), 2);
}

#[tokio::test]
async fn error_state_surfaces_every_message_and_still_deletes() {
    let client = ScriptedClient::new();
    client.accept(vec![SubReportPlan::errors(&[
        "invalid filter",
        "column not found",
    ])]);

    let runner = ReportJobRunner::new(&client, fast_policy());
    let run = runner.run(&definition()).await.unwrap();

    assert!(run.results.is_empty());
    assert_eq!(run.failures.len(), 1);
    match &run.failures[0].error {
        JobError::Failed { messages } => {
            assert_eq!(messages, &vec!["invalid filter", "column not found"]);
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    assert_eq!(client.data_calls(), 0);
    assert_eq!(client.deleted().len(), 1);
}

#[tokio::test]
async fn sibling_sub_reports_are_independent() {
    let client = ScriptedClient::new();
    let good = payload(vec![summary_row(2, "B", 99.0)]);
    client.accept(vec![
        SubReportPlan::errors(&["boom"]),
        SubReportPlan::completes_after(&["executing"], good.clone()),
    ]);

    let runner = ReportJobRunner::new(&client, fast_policy());
    let run = runner.run(&definition()).await.unwrap();

    assert_eq!(run.results, vec![good]);
    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].index, 0);
    assert_eq!(run.failures[0].item_id, "i0");
    assert_eq!(
        client.deleted(),
        vec![
            ("j1".to_string(), "i0".to_string()),
            ("j1".to_string(), "i1".to_string())
        ]
    );
}

#[tokio::test]
async fn stuck_job_times_out_after_max_polls_and_is_deleted() {
    let client = ScriptedClient::new();
    client.accept(vec![SubReportPlan::stuck()]);

    let policy = PollPolicy {
        max_polls: 3,
        ..fast_policy()
    };
    let runner = ReportJobRunner::new(&client, policy);
    let run = runner.run(&definition()).await.unwrap();

    assert!(run.results.is_empty());
    assert!(matches!(
        run.failures[0].error,
        JobError::TimedOut { polls: 3, .. }
    ));
    assert_eq!(client.status_calls(), 3);
    assert_eq!(client.data_calls(), 0);
    assert_eq!(client.deleted().len(), 1);
}

#[tokio::test]
async fn stuck_job_times_out_on_wall_clock_budget() {
    let client = ScriptedClient::new();
    client.accept(vec![SubReportPlan::stuck()]);

    let policy = PollPolicy {
        interval: Duration::from_millis(1),
        max_polls: 1_000,
        timeout: Duration::ZERO,
    };
    let runner = ReportJobRunner::new(&client, policy);
    let run = runner.run(&definition()).await.unwrap();

    assert!(matches!(
        run.failures[0].error,
        JobError::TimedOut { polls: 1, .. }
    ));
    assert_eq!(client.deleted().len(), 1);
}

#[tokio::test]
async fn rejected_submission_is_an_error_with_nothing_to_clean_up() {
    let client = ScriptedClient::new();
    client.reject(401);

    let runner = ReportJobRunner::new(&client, fast_policy());
    let err = runner.run(&definition()).await.unwrap_err();

    assert!(matches!(err, ClientError::Status { status: 401, .. }));
    assert!(client.deleted().is_empty());
    assert_eq!(client.status_calls(), 0);
}

#[tokio::test]
async fn data_fetch_failure_is_a_sub_report_failure_and_cleans_up() {
    let client = ScriptedClient::new();
    client.accept(vec![SubReportPlan::data_fails(503)]);

    let runner = ReportJobRunner::new(&client, fast_policy());
    let run = runner.run(&definition()).await.unwrap();

    assert!(run.results.is_empty());
    assert!(matches!(
        run.failures[0].error,
        JobError::Client(ClientError::Status { status: 503, .. })
    ));
    assert_eq!(client.deleted().len(), 1);
}

#[tokio::test]
async fn delete_failure_is_logged_not_escalated() {
    let client = ScriptedClient::new();
    let data = payload(vec![vec![json!(1), json!("A")]]);
    client.accept(vec![SubReportPlan::completes(data.clone()).delete_fails(500)]);

    let runner = ReportJobRunner::new(&client, fast_policy());
    let run = runner.run(&definition()).await.unwrap();

    assert_eq!(run.results, vec![data]);
    assert!(run.failures.is_empty());
    assert_eq!(client.deleted().len(), 1);
}

#[tokio::test]
async fn submitted_definition_is_sent_unchanged() {
    let client = ScriptedClient::new();
    client.accept(vec![SubReportPlan::completes(payload(vec![]))]);

    let def = definition();
    let runner = ReportJobRunner::new(&client, fast_policy());
    runner.run(&def).await.unwrap();

    assert_eq!(client.submitted(), vec![def]);
}

#[tokio::test]
async fn error_state_logs_one_warning_with_all_messages() {
    let logs = LogCapture::default();
    let _guard = tracing::subscriber::set_default(logs.subscriber());
    let client = ScriptedClient::new();
    client.accept(vec![SubReportPlan::errors(&[
        "invalid filter",
        "column not found",
    ])]);

    ReportJobRunner::new(&client, fast_policy())
        .run(&definition())
        .await
        .unwrap();

    assert_eq!(logs.count("WARN"), 1, "{:#?}", logs.lines());
    let warning = logs
        .lines()
        .into_iter()
        .find(|l| l.contains(" WARN "))
        .unwrap();
    assert!(warning.contains("invalid filter; column not found"));
}
