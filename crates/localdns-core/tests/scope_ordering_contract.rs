//! Contract Test: Scope Ordering
//!
//! The scope hierarchy is API key → organization → network.
//!
//! Constraints verified:
//! - Requiring an organization without the key fails setup
//! - Requiring a network without both ancestors fails setup
//! - Only required fields are set, and a failure keeps earlier fields
//! - Status reporting before and after setup
//!
//! If this test fails, the scope wrapper accepts out-of-order configuration.

mod common;

use common::*;
use localdns_core::scope::NO_REQUIRED_PARAMETERS;
use localdns_core::{RequiredParameters, SetupParameters};

fn full_parameters() -> SetupParameters {
    SetupParameters::new()
        .with_api_key("abcd-efgh-1234")
        .with_organization("o1", Some("Acme".to_string()))
        .with_network("n1", Some("Branch".to_string()))
}

#[test]
fn every_flag_combination_follows_the_hierarchy() {
    for mask in 0u8..8 {
        let required = RequiredParameters {
            api_key: mask & 0b001 != 0,
            organization_id: mask & 0b010 != 0,
            network_id: mask & 0b100 != 0,
        };
        let valid = (!required.organization_id || required.api_key)
            && (!required.network_id || (required.api_key && required.organization_id));

        let mut session = bare_session(MockTransport::new());
        let ok = session.setup_application_parameters(required, Some(&full_parameters()), None);

        assert_eq!(ok, valid, "unexpected setup outcome for {:?}", required);
        if !valid {
            assert!(session.scope().required().is_none());
            assert!(!session.scope().is_organization_set());
        }
    }
}

#[test]
fn only_required_fields_are_set() {
    let mut session = bare_session(MockTransport::new());

    assert!(session.setup_application_parameters(
        RequiredParameters::api_key_only(),
        Some(&full_parameters()),
        None
    ));

    assert!(session.is_api_key_set());
    assert!(!session.scope().is_organization_set());
    assert!(!session.scope().is_network_set());
}

#[test]
fn missing_required_value_fails_without_rollback() {
    let mut session = bare_session(MockTransport::new());
    let supplied = SetupParameters::new().with_api_key("abcd-efgh-1234");

    assert!(!session.setup_application_parameters(
        RequiredParameters::organization(),
        Some(&supplied),
        None
    ));

    // The key set before the failure stays set
    assert!(session.is_api_key_set());
    assert!(!session.scope().is_organization_set());

    let status = session.check_current_parameters_status();
    assert!(!status.all_set);
    assert_eq!(status.missing, vec!["ORGANIZATION_ID".to_string()]);
}

#[test]
fn missing_key_fails_setup() {
    let mut session = bare_session(MockTransport::new());

    assert!(!session.setup_application_parameters(
        RequiredParameters::api_key_only(),
        None,
        None
    ));
    assert!(!session.is_api_key_set());
}

#[test]
fn network_setup_records_names() {
    let mut session = bare_session(MockTransport::new());

    assert!(session.setup_application_parameters(
        RequiredParameters::network(),
        Some(&full_parameters()),
        Some(true)
    ));

    assert!(session.caching_enabled());
    assert_eq!(session.scope().organization_name(), Some("Acme"));
    assert_eq!(session.scope().network_id(), Some("n1"));
    assert_eq!(session.scope().network_name(), Some("Branch"));

    let status = session.check_current_parameters_status();
    assert!(status.all_set);
    assert!(status.missing.is_empty());
}

#[test]
fn status_before_setup_is_a_placeholder() {
    let session = bare_session(MockTransport::new());

    let status = session.check_current_parameters_status();
    assert!(!status.all_set);
    assert_eq!(status.missing, vec![NO_REQUIRED_PARAMETERS.to_string()]);
}

#[test]
fn empty_ids_are_ignored() {
    let mut session = scoped_session(MockTransport::new(), false);

    session.set_organization("", Some("Nobody"));
    assert_eq!(session.scope().organization_id(), Some("o1"));
    assert_eq!(session.scope().organization_name(), Some("Acme"));

    session.set_network("", None);
    assert!(!session.scope().is_network_set());
}

#[test]
fn current_params_mask_the_key() {
    let mut session = bare_session(MockTransport::new());
    assert!(session.setup_application_parameters(
        RequiredParameters::organization(),
        Some(&full_parameters()),
        None
    ));

    let params = session.current_app_params();
    assert_eq!(params["api_key"].value, "**********1234");
    assert_eq!(params["api_key"].label, "API Key");
    assert_eq!(params["organization_id"].value, "o1");
    assert_eq!(params["organization_name"].value, "Acme");
    assert!(!params.contains_key("network_id"));
}
