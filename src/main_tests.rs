//! Unit tests for the `mcn-conform` CLI binary implementation.
//!
//! Keeping these tests in a separate module keeps `src/main.rs` focused on
//! dispatch.

use super::*;
use mcn_conform::test_support::{ScriptedTransport, harness_config};
use mcn_conform::{RequestExecutor, RetryPolicy};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::io::Write as _;
use tempfile::NamedTempFile;

#[fixture]
fn transport() -> ScriptedTransport {
    ScriptedTransport::new()
}

fn runner(transport: &ScriptedTransport) -> ScenarioRunner<ScriptedTransport> {
    let policy = RetryPolicy::single_attempt().with_backoff(Duration::ZERO, Duration::ZERO);
    ScenarioRunner::new(
        RequestExecutor::new(transport.clone(), policy),
        harness_config("http://api.test"),
    )
}

fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(std::iter::once("mcn-conform").chain(args.iter().copied()))
        .expect("arguments should parse")
        .command
}

async fn execute_args(transport: &ScriptedTransport, args: &[&str]) -> (i32, String) {
    let mut out = Vec::new();
    let code = execute(parse(args), &runner(transport), Duration::ZERO, &mut out)
        .await
        .expect("command should not fail the process");
    (code, String::from_utf8(out).expect("utf8 output"))
}

#[rstest]
#[tokio::test]
async fn bulk_vpc_prints_run_and_exits_zero(transport: ScriptedTransport) {
    for id in ["vpc-aaaaaaaa01", "vpc-aaaaaaaa02"] {
        transport.push_response(404, "");
        transport.push_json(201, &json!({ "id": id }));
    }

    let (code, output) =
        execute_args(&transport, &["bulk-vpc", "2", "10.0.0.0/16", "10.1.0.0/16"]).await;

    assert_eq!(code, EXIT_PASSED);
    let run: Value = serde_json::from_str(&output).expect("bulk run is JSON");
    assert_eq!(run["requested_count"], json!(2));
    assert_eq!(run["results"][1]["identifier"], json!("vpc-aaaaaaaa02"));
}

#[rstest]
#[tokio::test]
async fn bulk_failure_exits_two(transport: ScriptedTransport) {
    transport.push_response(404, "");
    transport.push_response(500, "boom");

    let (code, _) = execute_args(&transport, &["bulk-vpc", "1", "10.0.0.0/16"]).await;

    assert_eq!(code, EXIT_CHECKS_FAILED);
}

#[rstest]
#[tokio::test]
async fn invalid_bulk_request_is_a_process_failure(transport: ScriptedTransport) {
    let mut out = Vec::new();
    let err = execute(
        parse(&["bulk-subnet", "--vpc-id", "subnet-1", "1", "10.0.1.0/24"]),
        &runner(&transport),
        Duration::ZERO,
        &mut out,
    )
    .await
    .expect_err("parent id is invalid");

    assert!(matches!(err, CliError::Bulk(BulkError::InvalidBulkRequest(_))));
    assert!(transport.requests().is_empty());
}

#[rstest]
#[tokio::test]
async fn teardown_deletes_recovered_identifiers(transport: ScriptedTransport) {
    transport.push_response(404, "");
    transport.push_json(201, &json!({"subnetId": "subnet-01"}));
    transport.push_json(200, &json!({"message": "deleted"}));

    let (code, output) = execute_args(
        &transport,
        &[
            "bulk-subnet",
            "--vpc-id",
            "vpc-0123456789",
            "--teardown",
            "1",
            "10.0.1.0/24",
        ],
    )
    .await;

    assert_eq!(code, EXIT_PASSED);
    assert!(output.contains("\"deleted\""), "{output}");
    let last = transport.requests().pop().expect("delete sent");
    assert_eq!(last.url, "http://api.test/cloud/subnet/subnet-01");
}

#[rstest]
#[tokio::test]
async fn delete_failure_exits_two(transport: ScriptedTransport) {
    transport.push_json(200, &json!({}));
    transport.push_response(404, "missing");

    let (code, output) =
        execute_args(&transport, &["delete-vpc", "vpc-00000001", "vpc-00000002"]).await;

    assert_eq!(code, EXIT_CHECKS_FAILED);
    let summary: Value = serde_json::from_str(&output).expect("summary is JSON");
    assert_eq!(summary["deleted"], json!(["vpc-00000001"]));
    assert_eq!(summary["failed"][0]["identifier"], json!("vpc-00000002"));
}

#[rstest]
#[tokio::test]
async fn scenario_reads_field_table_from_file(transport: ScriptedTransport) {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "cidrBlock=10.0.0.0/16\ntagName=cli-vpc").expect("write fields");
    let path = file.path().to_str().expect("utf8 temp path").to_owned();
    transport.push_response(404, "");
    transport.push_json(201, &json!({"id": "vpc-0123456789"}));

    let (code, output) =
        execute_args(&transport, &["scenario", "create-vpc", "--fields", &path]).await;

    assert_eq!(code, EXIT_PASSED);
    assert_eq!(
        output.trim(),
        "create-vpc: passed (status 201, id vpc-0123456789)"
    );
    let sent = transport.requests().pop().expect("create sent");
    let payload = sent.payload.expect("payload");
    assert_eq!(payload["tags"]["Name"], json!("cli-vpc"));
}

#[rstest]
#[tokio::test]
async fn conflicted_scenario_is_inconclusive(transport: ScriptedTransport) {
    transport.push_response(400, r#"{"error":"Another update is currently in progress"}"#);

    let (code, output) = execute_args(
        &transport,
        &["scenario", "delete-subnet", "--target-id", "subnet-1"],
    )
    .await;

    assert_eq!(code, EXIT_CHECKS_FAILED);
    assert!(output.contains("inconclusive"), "{output}");
}

#[rstest]
#[tokio::test]
async fn missing_field_file_is_reported(transport: ScriptedTransport) {
    let mut out = Vec::new();
    let err = execute(
        parse(&["scenario", "create-vpc", "--fields", "/nonexistent/fields.txt"]),
        &runner(&transport),
        Duration::ZERO,
        &mut out,
    )
    .await
    .expect_err("file is missing");

    assert!(matches!(err, CliError::FieldTable { .. }), "{err}");
}

#[rstest]
#[case(200, "healthy", EXIT_PASSED)]
#[case(404, "health endpoint not exposed", EXIT_PASSED)]
#[case(503, "server error (503)", EXIT_CHECKS_FAILED)]
#[tokio::test]
async fn health_reports_status(
    transport: ScriptedTransport,
    #[case] status: u16,
    #[case] line: &str,
    #[case] expected: i32,
) {
    transport.push_response(status, "");

    let (code, output) = execute_args(&transport, &["health"]).await;

    assert_eq!(code, expected);
    assert_eq!(output.trim(), line);
}

#[rstest]
fn bulk_vpc_requires_cidrs() {
    let result = Cli::try_parse_from(["mcn-conform", "bulk-vpc", "2"]);
    assert!(result.is_err());
}

#[test]
fn write_error_writes_cli_error() {
    let mut buf = Vec::new();
    let err = CliError::Catalog(CatalogError::UnknownScenario(String::from("resize")));
    write_error(&mut buf, &err);
    let rendered = String::from_utf8(buf).expect("utf8");
    assert!(
        rendered.contains("unknown scenario 'resize'"),
        "rendered: {rendered}"
    );
}
