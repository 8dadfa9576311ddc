//! Bundle loading: container detection, entry selection and re-entry

mod common;

use bigip_explode::config::ExplodeConfig;
use bigip_explode::domain::BundleKind;
use bigip_explode::error::ExplodeError;
use bigip_explode::pipeline::Exploder;

use common::{APP_CONF, TarBuilder, TestWorkspace, gzip};

fn ucs() -> Vec<u8> {
    TarBuilder::new()
        .dir("config/")
        .file("config/bigip.conf", APP_CONF)
        .file("config/bigip_base.conf", "net vlan /Common/ext {\n    tag 10\n}\n")
        .file("config/partitions/Tenant/bigip.conf", "ltm node /Tenant/n7 {\n    address 10.7.0.1\n}\n")
        .file("var/log/ltm", "Jan  1 00:00:00 info mcpd: not configuration\n")
        .file("config/bigip_user.conf", "auth user admin { }\n")
        .tar_gz()
}

#[test]
fn test_system_archive_reads_configured_entries_in_order() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("backup.ucs", &ucs());

    let result = Exploder::default().explode(&path).expect("explodes").result;
    assert_eq!(result.bundle_kind, BundleKind::SystemArchive);
    let names: Vec<&str> = result.sources.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "config/bigip_base.conf",
            "config/bigip.conf",
            "config/partitions/Tenant/bigip.conf"
        ]
    );
    assert_eq!(result.stats.files_processed, 3);
    assert!(result.orphan_objects.contains(&"/Tenant/n7".to_string()));
    assert!(!result.orphan_objects.iter().any(|o| o.contains("admin")));
}

#[test]
fn test_extension_does_not_decide_kind() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("looks-like-text.conf", &ucs());
    let result = Exploder::default().explode(&path).expect("explodes").result;
    assert_eq!(result.bundle_kind, BundleKind::SystemArchive);
}

#[test]
fn test_diagnostic_snapshot_detected_by_marker_entries() {
    let bundle = TarBuilder::new()
        .file("config/bigip.conf", APP_CONF)
        .file("commands/tmsh_-q_list_sys_version", "Sys::Version\n")
        .tar_gz();
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("support.qkview", &bundle);

    let result = Exploder::default().explode(&path).expect("explodes").result;
    assert_eq!(result.bundle_kind, BundleKind::DiagnosticSnapshot);
    assert_eq!(result.applications.len(), 1);
}

#[test]
fn test_uncompressed_tar() {
    let bundle = TarBuilder::new().file("./config/bigip.conf", APP_CONF).tar();
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("backup.tar", &bundle);

    let result = Exploder::default().explode(&path).expect("explodes").result;
    assert_eq!(result.bundle_kind, BundleKind::SystemArchive);
    assert_eq!(result.sources[0].name, "config/bigip.conf");
}

#[test]
fn test_gzipped_plain_config() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("bigip.conf.gz", &gzip(APP_CONF.as_bytes()));

    let result = Exploder::default().explode(&path).expect("explodes").result;
    assert_eq!(result.bundle_kind, BundleKind::PlainConfig);
    assert_eq!(result.sources[0].name, "bigip.conf");
    assert_eq!(result.applications.len(), 1);
}

#[test]
fn test_archive_without_configuration_is_empty() {
    let bundle = TarBuilder::new().file("var/log/ltm", "nothing here\n").tar_gz();
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("backup.ucs", &bundle);

    let err = Exploder::default().explode(&path).unwrap_err();
    assert!(matches!(err, ExplodeError::ArchiveEmpty { .. }));
}

#[test]
fn test_unrecognized_and_unreadable_bundles() {
    let workspace = TestWorkspace::new();
    let zip = workspace.write_bytes("backup.zip", &[0x50, 0x4b, 0x03, 0x04, 0x14, 0, 0, 0]);
    let err = Exploder::default().explode(&zip).unwrap_err();
    assert!(matches!(err, ExplodeError::ArchiveUnrecognized { .. }));

    let err = Exploder::default()
        .explode(&workspace.path.join("missing.ucs"))
        .unwrap_err();
    assert!(matches!(err, ExplodeError::ArchiveUnreadable { .. }));
}

#[test]
fn test_custom_include_patterns() {
    let mut config = ExplodeConfig::default();
    config.archive.include = vec!["config/bigip_user.conf".to_string()];
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("backup.ucs", &ucs());

    let result = Exploder::new(config).explode(&path).expect("explodes").result;
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].name, "config/bigip_user.conf");
    assert_eq!(result.orphan_objects, vec!["auth user admin"]);
}

#[test]
fn test_export_reenters_at_object_store() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_bytes("backup.ucs", &ucs());
    let first = Exploder::default().explode(&path).expect("explodes");

    let export = first.store.export().to_json().expect("serializes");
    let export_path = workspace.write_file("objects.json", &export);
    let second = Exploder::default().explode(&export_path).expect("explodes");

    assert_eq!(second.result.bundle_kind, BundleKind::PreParsedBundle);
    assert_eq!(second.result.stats.parse_errors.len(), 0);
    assert_eq!(second.store.len(), first.store.len());
    assert_eq!(
        second.result.without_timings().applications,
        first.result.without_timings().applications
    );
    assert_eq!(second.result.orphan_objects, first.result.orphan_objects);
    assert_eq!(
        second.application_config("/Common/vs_app"),
        first.application_config("/Common/vs_app")
    );
}
