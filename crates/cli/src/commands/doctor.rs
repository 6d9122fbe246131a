//! Doctor command - validate configuration and show status

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::AppConfig;
use crate::wiring;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    upstream: CheckResult,
    store: CheckResult,
    server: CheckResult,
    github: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        upstream: CheckResult::error("Not checked"),
        store: CheckResult::error("Not checked"),
        server: CheckResult::error("Not checked"),
        github: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.upstream = check_upstream(config);
        report.store = check_store(config).await;
        report.server = check_server(config);
        report.github = check_github(config);
    }

    let checks = [
        &report.config,
        &report.upstream,
        &report.store,
        &report.server,
        &report.github,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

fn check_upstream(config: &AppConfig) -> CheckResult {
    let upstream = &config.upstream;

    if let Err(e) = upstream.settings() {
        return CheckResult::error(format!("{:#}", e));
    }

    match wiring::build_aggregator(config) {
        Ok(aggregator) => {
            let platforms = aggregator.platforms();
            CheckResult::ok(format!(
                "Provider: {}, Timeout: {}s, Platforms: {}",
                upstream.provider,
                upstream.timeout_secs,
                platforms.len()
            ))
            .with_details(serde_json::json!({
                "platforms": platforms,
                "recent_limit": upstream.recent_limit,
                "hackerrank_strategy": config.hackerrank.strategy,
            }))
        }
        Err(e) => CheckResult::error(format!("{:#}", e)),
    }
}

async fn check_store(config: &AppConfig) -> CheckResult {
    match config.general.store.as_str() {
        "memory" => CheckResult::warn("Store: memory (handles are lost on restart)"),
        "sqlite" => match wiring::build_store(config).await {
            Ok(_) => CheckResult::ok(format!(
                "Store: sqlite ({})",
                config.general.store_path.display()
            )),
            Err(e) => CheckResult::error(format!("{:#}", e)),
        },
        other => CheckResult::error(format!("Unknown store: {}", other)),
    }
}

fn check_server(config: &AppConfig) -> CheckResult {
    let server = &config.server;

    if server.listen_addr.parse::<std::net::SocketAddr>().is_err() {
        return CheckResult::warn(format!(
            "Listen address is not an ip:port pair: {}",
            server.listen_addr
        ));
    }

    if server.allowed_origins.is_empty() {
        return CheckResult::warn(format!(
            "Listen: {}, no CORS origins allowed",
            server.listen_addr
        ));
    }

    CheckResult::ok(format!(
        "Listen: {}, CORS origins: {}",
        server.listen_addr,
        server.allowed_origins.len()
    ))
}

fn check_github(config: &AppConfig) -> CheckResult {
    if config.upstream.provider == "stub" {
        return CheckResult::ok("Provider: stub (no token needed)");
    }

    let env_var = &config.github.token_env;
    match wiring::load_token(env_var, "GitHub") {
        Ok(_) => CheckResult::ok(format!("Token: {} (set)", env_var)),
        Err(_) => CheckResult::warn(format!(
            "Token: {} (not set), GitHub stats disabled",
            env_var
        )),
    }
}

fn print_report(report: &DoctorReport) {
    println!("devstats Doctor Report");
    println!("======================");
    println!();

    print_check("Config", &report.config);
    print_check("Upstream", &report.upstream);
    print_check("Handle Store", &report.store);
    print_check("Server", &report.server);
    print_check("GitHub", &report.github);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall != "error" {
        println!();
        println!("Ready to run! Try: devstats serve");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}
