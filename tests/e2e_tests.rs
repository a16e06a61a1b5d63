//! End-to-end tests for the specscan CLI
//!
//! These tests verify:
//! - Argument and config file handling
//! - Text and JSON report output against a mock registry
//! - Exit codes: 0 complete, 1 fatal, 2 partial

use assert_cmd::Command;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use predicates::prelude::*;
use std::io::Write;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn specscan() -> Command {
    let mut cmd = Command::cargo_bin("specscan").unwrap();
    cmd.env_remove("SPECSCAN_PASSWORD")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn bundle_manifest(spec_yaml: &str) -> Vec<u8> {
    let compat = serde_json::json!({
        "config": { "Labels": { "com.redhat.apb.spec": STANDARD.encode(spec_yaml) } }
    });
    serde_json::to_vec(&serde_json::json!({
        "schemaVersion": 1,
        "history": [ { "v1Compatibility": compat.to_string() } ],
    }))
    .unwrap()
}

/// Registry with one bundle image and one plain image
async fn mock_registry() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/_catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "repositories": ["bundles/mediawiki-apb", "bundles/nginx"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/bundles/mediawiki-apb/manifests/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bundle_manifest(
            "version: 1.0\nname: mediawiki-apb\nplans:\n  - name: default\n",
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/bundles/nginx/manifests/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "schemaVersion": 1,
            "history": [ { "v1Compatibility": "{\"config\":{}}" } ],
        })))
        .mount(&server)
        .await;
    server
}

mod arguments {
    use super::*;

    #[test]
    fn test_help() {
        specscan()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--registry"))
            .stdout(predicate::str::contains("--image"));
    }

    #[test]
    fn test_version() {
        specscan()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_missing_url_is_fatal() {
        specscan()
            .assert()
            .code(1)
            .stderr(predicate::str::contains("requires a registry URL"));
    }

    #[test]
    fn test_invalid_url_is_fatal() {
        specscan()
            .args(["--url", "ftp://registry.example.com"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("invalid registry URL"));
    }

    #[test]
    fn test_bad_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "page_size = \"many\"").unwrap();

        specscan()
            .arg("--config")
            .arg(file.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("failed to parse config file"));
    }

    #[cfg(not(feature = "ecr"))]
    #[test]
    fn test_ecr_needs_feature() {
        specscan()
            .args(["--registry", "ecr"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("enable the 'ecr' feature"));
    }
}

mod scanning {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scan_json_output() {
        let server = mock_registry().await;

        let output = specscan()
            .args(["--url", &server.uri(), "--json"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["registry"], "v2");
        assert_eq!(json["outcome"], "complete");
        assert_eq!(json["summary"]["images"], 2);
        assert_eq!(json["specs"][0]["name"], "mediawiki-apb");
        assert_eq!(json["specs"][0]["plans"][0]["name"], "default");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scan_text_output() {
        let server = mock_registry().await;

        specscan()
            .args(["--url", &server.uri()])
            .assert()
            .success()
            .stdout(predicate::str::contains("v2 registry, tag latest"))
            .stdout(predicate::str::contains("mediawiki-apb"))
            .stdout(predicate::str::contains("1 spec in 2 images, 1 without a spec"))
            .stdout(predicate::str::contains("Errors").not());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scan_partial_exit_code() {
        let server = mock_registry().await;

        specscan()
            .args(["--url", &server.uri()])
            .args(["--image", "bundles/mediawiki-apb", "--image", "bundles/missing"])
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Errors"))
            .stdout(predicate::str::contains("'bundles/missing'"))
            .stdout(predicate::str::contains("(incomplete)"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scan_explicit_image_from_config_file() {
        let server = mock_registry().await;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "url = \"{}\"\norg = \"bundles\"", server.uri()).unwrap();

        specscan()
            .arg("--config")
            .arg(file.path())
            .args(["--image", "bundles/mediawiki-apb", "--quiet"])
            .assert()
            .success()
            .stdout("1 spec in 1 image\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scan_exclude() {
        let server = mock_registry().await;

        specscan()
            .args(["--url", &server.uri(), "--exclude", "bundles/nginx", "-q"])
            .assert()
            .success()
            .stdout("1 spec in 1 image\n");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scan_unauthorized_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        specscan()
            .args(["--url", &server.uri(), "--username", "robot"])
            .env("SPECSCAN_PASSWORD", "wrong")
            .assert()
            .code(1)
            .stdout(predicate::str::contains("rejected the configured credentials"));
    }
}
