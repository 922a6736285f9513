use std::path::Path;

use hookline_core::config::AppConfig;
use hookline_discord::{builtin::builtin_registry, verify::SignatureVerifier};
use serde::Serialize;

use crate::commands::{load_options, CommandResult};

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

pub fn run(config_file: Option<&Path>, json_output: bool) -> CommandResult {
    let report = build_report(config_file);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 3 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(config_file: Option<&Path>) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(load_options(config_file)) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_public_key(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "public_key_readiness",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }
    checks.push(check_command_registry());

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_public_key(config: &AppConfig) -> DoctorCheck {
    let (status, details) = match SignatureVerifier::from_hex(config.discord.public_key.as_deref()) {
        Ok(verifier) if verifier.is_configured() => {
            (CheckStatus::Pass, "ed25519 public key decoded".to_string())
        }
        Ok(_) => (
            CheckStatus::Fail,
            "discord.public_key is not set; every interaction request would fail with 500"
                .to_string(),
        ),
        Err(error) => (CheckStatus::Fail, format!("discord.public_key is unusable: {error}")),
    };

    DoctorCheck { name: "public_key_readiness", status, details }
}

fn check_command_registry() -> DoctorCheck {
    match builtin_registry() {
        Ok(registry) => DoctorCheck {
            name: "command_registry",
            status: CheckStatus::Pass,
            details: format!("{} command(s) registered: {}", registry.len(), registry.names().join(", ")),
        },
        Err(error) => {
            DoctorCheck { name: "command_registry", status: CheckStatus::Fail, details: error.to_string() }
        }
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
