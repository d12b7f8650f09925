use airtable_sync::AirtableOpts;
use clap::Parser;
use std::time::Duration;

fn parse(args: &[&str]) -> AirtableOpts {
    let mut argv = vec!["airtable-sync"];
    argv.extend_from_slice(args);
    AirtableOpts::try_parse_from(argv).unwrap()
}

#[test]
fn test_airtable_opts_defaults() {
    let opts = parse(&["--api-key", "pat123"]);

    assert_eq!(opts.api_key, "pat123");
    assert_eq!(opts.requests_per_second, 5);
    assert_eq!(opts.request_timeout, "10s");
    assert_eq!(opts.retry_attempts, 3);
    assert_eq!(opts.retry_delay, "5s");
}

#[test]
fn test_retry_policy_from_opts() {
    let opts = parse(&[
        "--api-key",
        "pat123",
        "--retry-attempts",
        "5",
        "--retry-delay",
        "250ms",
    ]);

    let policy = opts.retry_policy().unwrap();
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.delay, Duration::from_millis(250));
}

#[test]
fn test_build_context_with_literal_token() {
    let opts = parse(&[
        "--api-key",
        "pat123",
        "--api-url",
        "http://localhost:9000/v0",
        "--requests-per-second",
        "0",
    ]);

    let ctx = opts.build_context().unwrap();
    assert_eq!(ctx.limiter.max_per_second(), 0);
    assert_eq!(ctx.retry.max_attempts, 3);
    assert!(ctx.schema_cache.is_empty());
}

#[test]
fn test_build_context_rejects_bad_durations() {
    let opts = parse(&["--api-key", "pat123", "--request-timeout", "soon"]);
    let err = opts.build_context().unwrap_err();
    assert!(err.to_string().contains("Invalid --request-timeout 'soon'"));

    let opts = parse(&["--api-key", "pat123", "--retry-delay", "1.5s"]);
    tokio_test::assert_err!(opts.build_context());
}

#[test]
fn test_build_context_reports_missing_env_token() {
    let opts = parse(&["--api-key", "env://AIRTABLE_SYNC_UNIT_TEST_MISSING_TOKEN"]);

    let err = opts.build_context().unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Failed to resolve API key"));
    assert!(message.contains("AIRTABLE_SYNC_UNIT_TEST_MISSING_TOKEN"));
}

#[test]
fn test_build_context_reads_env_token() {
    std::env::set_var("AIRTABLE_SYNC_UNIT_TEST_TOKEN", "pat-from-env");
    let opts = parse(&["--api-key", "env://AIRTABLE_SYNC_UNIT_TEST_TOKEN"]);

    tokio_test::assert_ok!(opts.build_context());
}
