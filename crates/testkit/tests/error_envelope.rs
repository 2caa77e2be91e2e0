//! Integration tests for shared error propagation.

use fid_shared::{ErrorCode, ErrorEnvelope, ErrorKind, UnexpectedError, normalize_unexpected_error};
use fid_testkit::errors::{common_error_codes, missing_trace_error, trace_io_error};

#[test]
fn error_envelope_crosses_crates() {
    let io = trace_io_error();
    assert_eq!(io.code, ErrorCode::io());
    assert!(io.class.is_retriable());

    let boxed: Box<dyn std::error::Error> = Box::new(io);
    let description = boxed.to_string();
    assert!(description.contains("trace read interrupted"));

    let missing = missing_trace_error("scenario-d.json");
    assert_eq!(missing.kind, ErrorKind::Unexpected);
    assert_eq!(missing.code, ErrorCode::not_found());
    assert_eq!(
        missing.metadata.get("trace").map(String::as_str),
        Some("scenario-d.json")
    );
}

#[test]
fn normalize_unexpected_error_is_available() {
    let envelope = normalize_unexpected_error(UnexpectedError::message("boom"));
    assert_eq!(envelope.code, ErrorCode::internal());
    assert_eq!(envelope.kind, ErrorKind::Unexpected);

    let io_error = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow disk");
    let envelope = normalize_unexpected_error(UnexpectedError::Io(io_error));
    assert_eq!(envelope.code, ErrorCode::io());
    assert!(envelope.class.is_retriable());
}

#[test]
fn common_codes_are_distinct_and_namespaced() {
    let codes = common_error_codes();
    let mut rendered: Vec<String> = codes.iter().map(ToString::to_string).collect();
    rendered.sort();
    rendered.dedup();

    assert_eq!(rendered.len(), codes.len());
    assert!(codes.iter().all(|code| code.namespace() == "core"));
}

#[test]
fn envelope_round_trips_through_json() -> Result<(), Box<dyn std::error::Error>> {
    let envelope = missing_trace_error("traces/missing.json");
    let encoded = serde_json::to_string(&envelope)?;
    let decoded: ErrorEnvelope = serde_json::from_str(&encoded)?;

    assert_eq!(decoded, envelope);
    assert_eq!(decoded.code.to_string(), "core:not_found");
    Ok(())
}
