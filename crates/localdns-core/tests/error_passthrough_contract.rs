//! Contract Test: Error Passthrough
//!
//! Domain operations return structured errors instead of panicking, and the
//! structured error serializes to the `{error, details, status_code}` shape
//! the presentation layer branches on.
//!
//! Constraints verified:
//! - HTTP failures carry status and raw body unchanged
//! - Transport failures map to distinct kinds
//! - Missing organization scope fails before any request
//! - No operation retries
//!
//! If this test fails, errors are lost or reshaped on the way up.

mod common;

use common::*;
use localdns_core::traits::{HttpMethod, TransportError};
use localdns_core::ErrorKind;
use serde_json::json;

#[tokio::test]
async fn delete_profile_404_passes_through() {
    let transport = MockTransport::new();
    let body = r#"{"errors":["Profile not found"]}"#;
    transport.respond(HttpMethod::Delete, "profiles/p404", 404, body);
    let session = scoped_session(transport.clone(), false);

    let err = session.local_dns().delete_profile("p404").await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::HttpError);
    assert_eq!(err.status_code, Some(404));
    assert_eq!(err.details, body);
    assert_eq!(
        serde_json::to_value(&err).unwrap(),
        json!({"error": "HTTPError", "details": body, "status_code": 404})
    );
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn transport_failures_keep_their_kind() {
    let cases = [
        (TransportError::Connection("dns error".into()), ErrorKind::ConnectionError, "ConnectionError"),
        (TransportError::Timeout("operation timed out".into()), ErrorKind::TimeoutError, "TimeoutError"),
        (TransportError::Request("builder error".into()), ErrorKind::RequestException, "RequestException"),
    ];

    for (failure, kind, tag) in cases {
        let transport = MockTransport::new();
        transport.fail(HttpMethod::Get, "records", failure);
        let session = scoped_session(transport.clone(), false);

        let err = session.local_dns().list_dns_records().await.unwrap_err();
        assert_eq!(err.kind, kind);

        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["error"], tag);
        assert!(value.get("status_code").is_none());
        assert_eq!(transport.call_count(), 1, "{} must not be retried", tag);
    }
}

#[tokio::test]
async fn operations_without_organization_never_hit_the_network() {
    let transport = MockTransport::new();
    let mut session = bare_session(transport.clone());
    session.set_api_key(Some(TEST_API_KEY), "test");
    let dns = session.local_dns();

    let results = [
        dns.list_dns_records().await.map(|_| ()),
        dns.create_profile("Test").await.map(|_| ()),
        dns.delete_dns_record("r1").await,
        dns.assign_profile_to_network("n1", "p1").await.map(|_| ()),
        dns.remove_network_assignment("a1").await,
        dns.list_profiles(false).await.map(|_| ()),
    ];

    for result in results {
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoOrganizationSelected);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"error": "NoOrganizationSelected", "details": "Please select an organization first."})
        );
    }
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn undecodable_body_is_request_exception() {
    let transport = MockTransport::new();
    transport.respond(HttpMethod::Get, "records", 200, "<html>maintenance</html>");
    let session = scoped_session(transport, false);

    let err = session.local_dns().list_dns_records().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RequestException);
}

#[tokio::test]
async fn malformed_shape_is_unexpected_error() {
    let transport = MockTransport::new();
    transport.respond_json(HttpMethod::Get, "records", json!({"items": [{"hostname": 42}]}));
    transport.respond_json(HttpMethod::Post, "profiles", json!("not a profile"));
    let session = scoped_session(transport, false);
    let dns = session.local_dns();

    assert_eq!(
        dns.list_dns_records().await.unwrap_err().kind,
        ErrorKind::UnexpectedError
    );
    assert_eq!(
        dns.create_profile("Test").await.unwrap_err().kind,
        ErrorKind::UnexpectedError
    );
}

#[tokio::test]
async fn empty_create_response_is_unexpected_error() {
    let transport = MockTransport::new();
    transport.respond(HttpMethod::Post, "records", 201, "");
    let session = scoped_session(transport, false);

    let err = session
        .local_dns()
        .create_dns_record("p1", "printer.lan", "10.0.0.20")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedError);
}

#[tokio::test]
async fn secondary_fetch_failure_aborts_join() {
    let transport = MockTransport::new();
    transport.respond_json(HttpMethod::Get, "profiles", profiles_body(&[("p1", "Office")]));
    transport.respond(HttpMethod::Get, "organizations/o1/networks", 403, r#"{"errors":["Forbidden"]}"#);
    let session = scoped_session(transport.clone(), false);

    let err = session.local_dns().list_profiles(false).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::HttpError);
    assert_eq!(err.status_code, Some(403));
    assert_eq!(transport.calls_to(HttpMethod::Get, "profiles/assignments"), 0);
}
