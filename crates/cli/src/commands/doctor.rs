use secrecy::ExposeSecret;
use serde::Serialize;

use trivia_core::config::{AppConfig, LoadOptions};
use trivia_db::connect_with_config;

use crate::commands::CommandResult;

/// Process exit code when any readiness check fails.
pub const CHECK_FAILED_EXIT_CODE: u8 = 1;

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
    let exit_code =
        if report.overall_status == CheckStatus::Fail { CHECK_FAILED_EXIT_CODE } else { 0 };

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

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_chat_token(&config));
            checks.push(check_sheets(&config));
            checks.push(check_database_connectivity(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["chat_token_readiness", "sheets_configuration", "database_connectivity"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    // A skipped optional check (an unconfigured sheet) does not fail the report.
    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Bot tokens are three dot-separated segments.
fn check_chat_token(config: &AppConfig) -> DoctorCheck {
    let token = config.chat.bot_token.expose_secret();
    let segments: Vec<&str> = token.split('.').collect();
    let well_formed = segments.len() == 3 && segments.iter().all(|segment| !segment.is_empty());

    if well_formed {
        DoctorCheck {
            name: "chat_token_readiness",
            status: CheckStatus::Pass,
            details: "bot token has the expected three-segment shape".to_string(),
        }
    } else {
        DoctorCheck {
            name: "chat_token_readiness",
            status: CheckStatus::Fail,
            details: format!(
                "bot token has {} segment(s); expected three dot-separated segments",
                segments.len()
            ),
        }
    }
}

fn check_sheets(config: &AppConfig) -> DoctorCheck {
    match config.sheets.spreadsheet_id.as_deref().filter(|_| config.sheets.is_enabled()) {
        Some(spreadsheet_id) => DoctorCheck {
            name: "sheets_configuration",
            status: CheckStatus::Pass,
            details: format!(
                "mirroring new links to spreadsheet `{spreadsheet_id}` range `{}`",
                config.sheets.range
            ),
        },
        None => DoctorCheck {
            name: "sheets_configuration",
            status: CheckStatus::Skipped,
            details: "sheet mirror disabled; set sheets.spreadsheet_id to enable it".to_string(),
        },
    }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        pool.close().await;
        Ok::<(), String>(())
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        },
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
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
