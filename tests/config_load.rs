//! Coverage for the TOML config loader: the happy path through
//! `build_runtime`, and each of `validate_config`'s rejected shapes.

use acl_dataplane::{build_runtime, load_from_path, AclDataplaneError};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config file");
    file.write_all(text.as_bytes()).expect("write temp config file");
    file
}

#[test]
fn loads_a_well_formed_config_and_builds_a_runtime() {
    let file = write_config(
        r#"
        workers = 2

        [[interfaces]]
        index = 1
        input_lookup_context = 10
        output_lookup_context = 10

        [[acls]]
        [[acls.rules]]
        proto = "tcp"
        dst_port_low = 80
        dst_port_high = 80
        action = "permit_reflect"

        [[lookup_contexts]]
        lc_index = 10
        acl_indices = [0]
        "#,
    );

    let cfg = load_from_path(file.path()).expect("config should load");
    assert_eq!(cfg.workers, 2);
    assert_eq!(cfg.interfaces.len(), 1);

    let (_, _, workers) = build_runtime(&cfg).expect("runtime should build");
    assert_eq!(workers.len(), 2);
}

#[test]
fn rejects_a_config_with_no_interfaces() {
    let file = write_config(
        r#"
        workers = 1
        "#,
    );

    let err = load_from_path(file.path()).expect_err("no interfaces should be rejected");
    assert!(matches!(err, AclDataplaneError::NoInterfaces));
}

#[test]
fn rejects_a_lookup_context_referencing_an_out_of_range_acl() {
    let file = write_config(
        r#"
        [[interfaces]]
        index = 1
        input_lookup_context = 10

        [[lookup_contexts]]
        lc_index = 10
        acl_indices = [3]
        "#,
    );

    let err = load_from_path(file.path()).expect_err("out-of-range ACL index should be rejected");
    assert!(matches!(err, AclDataplaneError::Config(_)));
}

#[test]
fn rejects_an_interface_bound_to_an_unknown_lookup_context() {
    let file = write_config(
        r#"
        [[interfaces]]
        index = 1
        input_lookup_context = 99
        "#,
    );

    let err = load_from_path(file.path()).expect_err("unbound lookup context should be rejected");
    assert!(matches!(err, AclDataplaneError::UnknownLookupContext(99)));
}

#[test]
fn rejects_zero_workers() {
    let file = write_config(
        r#"
        workers = 0

        [[interfaces]]
        index = 1
        "#,
    );

    let err = load_from_path(file.path()).expect_err("zero workers should be rejected");
    assert!(matches!(err, AclDataplaneError::Config(_)));
}

#[test]
fn rejects_malformed_toml() {
    let file = write_config("this is not valid toml {{{");
    let err = load_from_path(file.path()).expect_err("malformed toml should be rejected");
    assert!(matches!(err, AclDataplaneError::Config(_)));
}
