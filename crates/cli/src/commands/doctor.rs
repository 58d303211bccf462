use std::time::Duration;

use clearaway_core::config::{AppConfig, LoadOptions, TransportKind};
use clearaway_delivery::build_transport;
use reqwest::Url;
use serde::Serialize;

use crate::commands::CommandResult;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                concat!(
                    "{{\"overall_status\":\"fail\",",
                    "\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}"
                ),
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_transport_configuration(&config));
            checks.push(check_mail_endpoint_health(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["transport_configuration", "mail_endpoint_health"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_transport_configuration(config: &AppConfig) -> DoctorCheck {
    match build_transport(config) {
        Ok(transport) => DoctorCheck {
            name: "transport_configuration",
            status: CheckStatus::Pass,
            details: format!("`{}` posts to `{}`", transport.name(), config.transport_url()),
        },
        Err(error) => DoctorCheck {
            name: "transport_configuration",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_mail_endpoint_health(config: &AppConfig) -> DoctorCheck {
    const NAME: &str = "mail_endpoint_health";

    if config.delivery.transport != TransportKind::MailEndpoint {
        return DoctorCheck {
            name: NAME,
            status: CheckStatus::Skipped,
            details: format!(
                "transport `{}` is a hosted service",
                config.delivery.transport.as_str()
            ),
        };
    }

    let health_url = match Url::parse(&config.mail_endpoint.url).and_then(|url| url.join("/health"))
    {
        Ok(url) => url,
        Err(error) => {
            return DoctorCheck {
                name: NAME,
                status: CheckStatus::Fail,
                details: format!("mail_endpoint.url is not a valid url: {error}"),
            }
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: NAME,
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let client = reqwest::Client::builder()
            .timeout(HEALTH_TIMEOUT)
            .build()
            .map_err(|error| format!("failed to build http client: {error}"))?;
        let response = client
            .get(health_url.clone())
            .send()
            .await
            .map_err(|error| format!("failed to reach `{health_url}`: {error}"))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("`{health_url}` answered {status}"))
        }
    });

    match result {
        Ok(()) => DoctorCheck {
            name: NAME,
            status: CheckStatus::Pass,
            details: format!("`{health_url}` reports ready"),
        },
        Err(details) => DoctorCheck { name: NAME, status: CheckStatus::Fail, details },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
