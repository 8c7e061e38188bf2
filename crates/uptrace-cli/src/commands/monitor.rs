//! Monitor commands.
//!
//! `apply` creates a monitor when its address has no state yet and updates
//! it otherwise. State is written only after Uptrace accepted the change, so
//! a failed command leaves the store as it was. The one exception is a create
//! whose read-back failed: the new id is recorded so it is not created twice.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use colored::Colorize;

use uptrace_core::client::UptraceClient;
use uptrace_core::defaults::with_defaults;
use uptrace_core::projection::to_remote;
use uptrace_core::types::Monitor;
use uptrace_core::validation::{validate_payload, validate_plan, ValidationMode};
use uptrace_core::{Diagnostic, Diagnostics, Error, MonitorData, MonitorReconciler, ReadOutcome, Value};

use super::cancel_on_ctrl_c;
use crate::config::Config;
use crate::error::CliError;
use crate::plan;
use crate::state::StateStore;

fn connect(config: &Config) -> Result<MonitorReconciler<UptraceClient>> {
    let client = UptraceClient::new(config.client_config()?)?;
    Ok(MonitorReconciler::new(client))
}

fn store(config: &Config) -> Result<StateStore> {
    config.ensure_dirs()?;
    Ok(StateStore::new(&config.paths.state_dir))
}

/// Print a failed operation and turn it into the command's error.
fn report(summary: &str, error: Error) -> anyhow::Error {
    let diagnostic = Diagnostic::from_error(summary, &error);
    eprintln!("{} {}", "✗".red(), diagnostic.to_string().red());
    anyhow::Error::new(error).context(summary.to_string())
}

/// Offline checks for a plan, given the state it would be applied to.
pub fn check_plan(plan: &MonitorData, state: Option<&MonitorData>) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();

    let mode = match state {
        Some(state) => ValidationMode::Update { state },
        None => ValidationMode::Create,
    };
    if let Err(e) = validate_plan(plan, mode) {
        diagnostics.add_error("plan is invalid", &e);
        return diagnostics;
    }

    // Update payloads depend on the monitor as Uptrace has it; only a create
    // can be checked end to end without the network.
    if state.is_none() {
        let payload = to_remote(plan, with_defaults(Monitor::default()))
            .and_then(|payload| validate_payload(&payload));
        if let Err(e) = payload {
            diagnostics.add_error("create payload is invalid", &e);
        }
    }

    diagnostics
}

pub async fn validate(path: &Path, config: &Config) -> Result<()> {
    let file = plan::load(path)?;
    let store = StateStore::new(&config.paths.state_dir);
    let state = store.get(&file.address)?;

    let diagnostics = check_plan(&file.plan, state.as_ref());
    if diagnostics.is_empty() {
        let action = if state.is_some() { "update" } else { "create" };
        println!(
            "{} {} is valid ({} on apply)",
            "✓".green(),
            file.address.cyan(),
            action
        );
        return Ok(());
    }

    for d in diagnostics.iter() {
        eprintln!("{} {}", "✗".red(), d.to_string().red());
    }
    bail!("{} problem(s) in {}", diagnostics.len(), path.display())
}

pub async fn apply(path: &Path, config: &Config) -> Result<()> {
    let file = plan::load(path)?;
    let store = store(config)?;
    let reconciler = connect(config)?;
    let cancel = cancel_on_ctrl_c();

    let (state, verb) = match store.get(&file.address)? {
        None => match reconciler.create(&file.plan, &cancel).await {
            Ok(state) => (state, "Created"),
            Err(e) => {
                if let Some(id) = remember_unconfirmed(&store, &file.address, &file.plan, &e)? {
                    eprintln!(
                        "{} Monitor {} exists in Uptrace; run `uptrace-monitor refresh {}`",
                        "⚠".yellow(),
                        id,
                        file.address
                    );
                }
                return Err(report(&format!("create {}", file.address), e));
            }
        },
        Some(current) => {
            let state = reconciler
                .update(&file.plan, &current, &cancel)
                .await
                .map_err(|e| report(&format!("update {}", file.address), e))?;
            (state, "Updated")
        }
    };

    store
        .put(&file.address, &state)
        .context("Monitor was applied but its state could not be saved")?;
    println!(
        "{} {} {} (id {})",
        "✓".green(),
        verb,
        file.address.cyan(),
        state.remote_id().unwrap_or("?")
    );
    Ok(())
}

/// Track a monitor whose create succeeded but could not be read back, so
/// the next apply updates it instead of creating another one.
fn remember_unconfirmed(
    store: &StateStore,
    address: &str,
    plan: &MonitorData,
    error: &Error,
) -> Result<Option<u64>> {
    let Some(id) = error.created_id() else {
        return Ok(None);
    };
    let placeholder = MonitorData {
        id: Value::Known(id.to_string()),
        ..plan.clone()
    };
    store
        .put(address, &placeholder)
        .with_context(|| format!("Monitor {} was created but could not be recorded", id))?;
    Ok(Some(id))
}

pub async fn refresh(address: &str, config: &Config) -> Result<()> {
    let store = store(config)?;
    let state = store
        .get(address)?
        .ok_or_else(|| CliError::UnknownAddress(address.to_string()))?;
    let reconciler = connect(config)?;

    let outcome = reconciler
        .read(&state, &cancel_on_ctrl_c())
        .await
        .map_err(|e| report(&format!("refresh {}", address), e))?;

    match outcome {
        ReadOutcome::Synced(next) => {
            let changed = next != state;
            store.put(address, &next)?;
            if changed {
                println!("{} {} refreshed (changed remotely)", "✓".green(), address.cyan());
            } else {
                println!("{} {} is up to date", "✓".green(), address.cyan());
            }
        }
        ReadOutcome::Absent => {
            store.remove(address)?;
            println!(
                "{} {} no longer exists in Uptrace; it will be recreated on the next apply",
                "⚠".yellow(),
                address.cyan()
            );
        }
    }
    Ok(())
}

pub async fn destroy(address: &str, config: &Config) -> Result<()> {
    let store = store(config)?;
    let state = store
        .get(address)?
        .ok_or_else(|| CliError::UnknownAddress(address.to_string()))?;
    let reconciler = connect(config)?;

    reconciler
        .delete(&state, &cancel_on_ctrl_c())
        .await
        .map_err(|e| report(&format!("destroy {}", address), e))?;

    store.remove(address)?;
    println!("{} Destroyed {}", "✓".green(), address.cyan());
    Ok(())
}

pub async fn import(address: &str, id: &str, config: &Config) -> Result<()> {
    let store = store(config)?;
    if store.get(address)?.is_some() {
        return Err(CliError::AddressTaken(address.to_string()).into());
    }
    let reconciler = connect(config)?;

    let state = reconciler
        .import(id, &cancel_on_ctrl_c())
        .await
        .map_err(|e| report(&format!("import {}", id), e))?;

    store.put(address, &state)?;
    println!("{} Imported monitor {} as {}", "✓".green(), id, address.cyan());
    print_monitor(&state);
    Ok(())
}

pub async fn show(id: &str, json: bool, config: &Config) -> Result<()> {
    let reconciler = connect(config)?;
    let state = reconciler
        .lookup(id, &cancel_on_ctrl_c())
        .await
        .map_err(|e| report(&format!("show {}", id), e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print_monitor(&state);
    }
    Ok(())
}

pub async fn list(config: &Config) -> Result<()> {
    let reconciler = connect(config)?;
    let monitors = reconciler
        .list(&cancel_on_ctrl_c())
        .await
        .map_err(|e| report("list monitors", e))?;

    if monitors.is_empty() {
        println!("{}", "No monitors".yellow());
        return Ok(());
    }

    println!("{}", "Monitors".cyan().bold());
    println!("{}", "─".repeat(60));
    for m in &monitors {
        println!(
            "  {:>8}  {:<8}  {:<8}  {}",
            m.remote_id().unwrap_or("?"),
            display(&m.monitor_type),
            display(&m.status),
            display(&m.name)
        );
    }
    println!();
    println!("  {} monitor(s)", monitors.len());
    Ok(())
}

fn print_monitor(m: &MonitorData) {
    println!("{}", display(&m.name).bold());
    println!("  ID:        {}", display(&m.id));
    println!("  Type:      {}", display(&m.monitor_type));
    println!("  Status:    {}", status_colored(m));
    println!("  Query:     {}", display(&m.query));
    println!("  Min value: {}", display(&m.min_allowed_value));
    println!("  Max value: {}", display(&m.max_allowed_value));
    if let Value::Known(created) = m.created_at {
        println!("  Created:   {}", timestamp(created));
    }
    if let Value::Known(updated) = m.updated_at {
        println!("  Updated:   {}", timestamp(updated));
    }
    if let Some(error) = m.error.known().filter(|e| !e.is_empty()) {
        println!("  Error:     {}", error.as_str().red());
    }
}

fn status_colored(m: &MonitorData) -> String {
    use uptrace_core::types::MonitorStatus;
    match m.status.known() {
        Some(MonitorStatus::Active) => "active".green().to_string(),
        Some(MonitorStatus::Paused) => "paused".yellow().to_string(),
        Some(MonitorStatus::Failed) => "failed".red().to_string(),
        None => "-".to_string(),
    }
}

fn display<T: std::fmt::Display>(value: &Value<T>) -> String {
    match value {
        Value::Known(v) => v.to_string(),
        Value::Null => "null".to_string(),
        Value::Unknown => "-".to_string(),
    }
}

fn timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}
