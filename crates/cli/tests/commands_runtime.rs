use std::env;
use std::sync::{Mutex, OnceLock};

use clearaway_cli::commands::{areas, config, doctor, mailto, submit};
use clearaway_cli::QuoteArgs;
use clearaway_core::config::ENV_KEYS;
use serde_json::Value;
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn quote() -> QuoteArgs {
    QuoteArgs {
        name: "A Smith".to_string(),
        postcode: "SW1A 1AA".to_string(),
        contact: "a@x.com".to_string(),
        details: "Old sofa, 2 chairs".to_string(),
        files: Vec::new(),
    }
}

#[test]
fn submit_reports_missing_fields_without_sending() {
    with_env(&[], || {
        let args = QuoteArgs { details: "   ".to_string(), ..quote() };

        let result = submit::run(&args, None, None);
        assert_eq!(result.exit_code, 3, "expected validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "submit");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "validation");
        assert_eq!(
            payload["message"],
            "Please fill in all required fields (Name, Postcode, Contact, and Details)."
        );
        assert_eq!(payload["details"]["missing"], serde_json::json!(["details"]));
    });
}

#[test]
fn submit_returns_config_failure_for_unconfigured_transport() {
    with_env(&[], || {
        let result = submit::run(&quote(), Some("form_relay"), None);
        assert_eq!(result.exit_code, 2, "expected config failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("form_relay.url"), "unexpected message: {message}");
    });
}

#[test]
fn submit_rejects_unknown_attachment_mode() {
    with_env(&[], || {
        let result = submit::run(&quote(), None, Some("thumbnails"));
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config");
    });
}

#[test]
fn submit_delivers_through_mail_endpoint_with_attachment() {
    let runtime = Runtime::new().expect("runtime");
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send-email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "Email sent successfully!"
            })))
            .expect(1)
            .mount(&server)
            .await;
        server
    });
    let endpoint = format!("{}/send-email", server.uri());

    let dir = tempfile::tempdir().expect("tempdir");
    let photo = dir.path().join("sofa.png");
    std::fs::write(&photo, [0x89, b'P', b'N', b'G']).expect("write photo");
    let missing = dir.path().join("missing.jpg");

    with_env(&[("CLEARAWAY_MAIL_ENDPOINT_URL", endpoint.as_str())], || {
        let args = QuoteArgs { files: vec![photo.clone(), missing.clone()], ..quote() };

        let result = submit::run(&args, None, None);
        assert_eq!(result.exit_code, 0, "unexpected output: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["message"], "Email sent successfully!");
        assert_eq!(payload["details"]["transport"], "mail_endpoint");
        assert_eq!(payload["details"]["attached"], serde_json::json!(["sofa.png"]));
        assert_eq!(payload["details"]["rejected"][0], "Failed to read file: missing.jpg");
        assert_eq!(payload["details"]["summary"]["name"], "A Smith");
        assert_eq!(payload["details"]["summary"]["attachment_count"], 1);
    });

    let requests = runtime.block_on(server.received_requests()).unwrap_or_default();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).expect("json body");
    assert_eq!(body["name"], "A Smith");
    assert_eq!(body["images"][0]["name"], "sofa.png");
    assert_eq!(body["images"][0]["mimeType"], "image/png");
    assert!(body["images"][0]["base64"].is_string());
}

#[test]
fn submit_reports_delivery_failure() {
    let runtime = Runtime::new().expect("runtime");
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send-email"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        server
    });
    let endpoint = format!("{}/send-email", server.uri());

    with_env(&[("CLEARAWAY_MAIL_ENDPOINT_URL", endpoint.as_str())], || {
        let result = submit::run(&quote(), None, None);
        assert_eq!(result.exit_code, 4, "expected delivery failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "delivery");
        assert_eq!(payload["message"], "Failed to send email. Please try again.");
        assert!(payload["details"]["summary"].is_null());
    });
}

#[test]
fn mailto_builds_encoded_link_for_recipient() {
    with_env(&[("CLEARAWAY_DELIVERY_RECIPIENT", "office@clear-away.co.uk")], || {
        let result = mailto::run(&quote());
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "mailto");
        assert_eq!(payload["message"], "Email client opened - please send the email manually.");
        let link = payload["details"]["mailto"].as_str().unwrap_or_default();
        assert!(link.starts_with("mailto:office@clear-away.co.uk?subject="), "{link}");
        assert!(link.contains("A%20Smith%20%28SW1A%201AA%29"), "{link}");
        assert!(link.contains("No%20images%20uploaded."), "{link}");
    });
}

#[test]
fn areas_expands_requested_county() {
    let result = areas::run(Some("surrey"));
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["message"], "Surrey expanded");
    let counties = payload["details"]["counties"].as_array().cloned().unwrap_or_default();
    assert_eq!(counties.len(), 5);
    let expanded: Vec<&Value> =
        counties.iter().filter(|county| county["expanded"] == true).collect();
    assert_eq!(expanded.len(), 1);
    assert_eq!(expanded[0]["name"], "Surrey");
    assert_eq!(expanded[0]["highlighted"], true);
}

#[test]
fn areas_rejects_unknown_county() {
    let result = areas::run(Some("Atlantis"));
    assert_eq!(result.exit_code, 3);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["error_class"], "unknown_county");
}

#[test]
fn config_output_redacts_secrets_and_names_sources() {
    with_env(
        &[
            ("CLEARAWAY_EMAIL_API_PUBLIC_KEY", "user_9f8e7d6c"),
            ("CLEARAWAY_EMAIL_API_PRIVATE_KEY", "very-secret-private-key"),
        ],
        || {
            let output = config::run();

            assert!(output.starts_with("effective config"));
            assert!(output.contains(
                "- email_api.public_key = user*** (source: env (CLEARAWAY_EMAIL_API_PUBLIC_KEY))"
            ));
            assert!(output.contains("- email_api.private_key = <redacted>"));
            assert!(!output.contains("very-secret-private-key"));
            assert!(output.contains("- delivery.transport = mail_endpoint (source: default)"));
        },
    );
}

#[test]
fn config_reports_validation_failure() {
    with_env(&[("CLEARAWAY_DELIVERY_RECIPIENT", "not-an-address")], || {
        let output = config::run();
        assert!(output.starts_with("config validation failed"), "{output}");
    });
}

#[test]
fn doctor_passes_when_mail_endpoint_is_healthy() {
    let runtime = Runtime::new().expect("runtime");
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        server
    });
    let endpoint = format!("{}/send-email", server.uri());

    with_env(&[("CLEARAWAY_MAIL_ENDPOINT_URL", endpoint.as_str())], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "unexpected report: {}", result.output);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "pass");
        let checks = report["checks"].as_array().cloned().unwrap_or_default();
        let names: Vec<&str> = checks.iter().filter_map(|check| check["name"].as_str()).collect();
        assert_eq!(names, ["config_validation", "transport_configuration", "mail_endpoint_health"]);
    });
}

#[test]
fn doctor_skips_health_probe_for_hosted_transport() {
    with_env(
        &[
            ("CLEARAWAY_DELIVERY_TRANSPORT", "form_upload"),
            ("CLEARAWAY_FORM_UPLOAD_URL", "https://formspree.io/f/abc123"),
        ],
        || {
            let result = doctor::run(false);
            assert_eq!(result.exit_code, 0, "unexpected report: {}", result.output);
            assert!(result.output.contains("- [skip] mail_endpoint_health"));
            assert!(result.output.contains("- [ok] transport_configuration"));
        },
    );
}

#[test]
fn doctor_fails_on_invalid_config() {
    with_env(&[("CLEARAWAY_DELIVERY_TRANSPORT", "carrier_pigeon")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["status"], "fail");
        assert_eq!(report["checks"][1]["status"], "skipped");
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|e| e.into_inner());

    let previous_values: Vec<(&str, Option<String>)> =
        ENV_KEYS.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in ENV_KEYS {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
