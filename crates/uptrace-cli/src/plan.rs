//! Plan files.
//!
//! A plan is one monitor in JSON or TOML using the declarative field names.
//! A missing field is left to Uptrace, `null` clears it. TOML has no null, so
//! TOML plans list the fields to clear in `null_fields`. The optional
//! `address` key names the monitor locally; the file stem is used otherwise.

use std::path::Path;

use serde_json::{Map, Value as Json};

use uptrace_core::MonitorData;

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, PartialEq)]
pub struct PlanFile {
    pub address: String,
    pub plan: MonitorData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Json,
    Toml,
}

impl PlanFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(PlanFormat::Json),
            "toml" => Some(PlanFormat::Toml),
            _ => None,
        }
    }
}

pub fn load(path: &Path) -> CliResult<PlanFile> {
    let invalid = |message: String| CliError::Plan {
        path: path.display().to_string(),
        message,
    };

    let format = PlanFormat::from_path(path)
        .ok_or_else(|| invalid("expected a .json or .toml file".into()))?;
    let content = std::fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    parse(&content, format, stem).map_err(invalid)
}

pub fn parse(content: &str, format: PlanFormat, default_address: &str) -> Result<PlanFile, String> {
    let mut fields = match format {
        PlanFormat::Json => serde_json::from_str::<Json>(content).map_err(|e| e.to_string())?,
        PlanFormat::Toml => toml::from_str::<Json>(content).map_err(|e| e.to_string())?,
    };
    let Json::Object(map) = &mut fields else {
        return Err("a plan must be an object".into());
    };

    let address = match map.remove("address") {
        Some(Json::String(s)) if !s.trim().is_empty() => s,
        Some(_) => return Err("address must be a non-empty string".into()),
        None if !default_address.is_empty() => default_address.to_string(),
        None => return Err("plan has no address".into()),
    };

    if let Some(nulls) = map.remove("null_fields") {
        apply_null_fields(map, nulls)?;
    }

    let plan = serde_json::from_value(fields).map_err(|e| e.to_string())?;
    Ok(PlanFile { address, plan })
}

fn apply_null_fields(map: &mut Map<String, Json>, nulls: Json) -> Result<(), String> {
    let Json::Array(names) = nulls else {
        return Err("null_fields must be a list of field names".into());
    };
    for name in names {
        let Json::String(name) = name else {
            return Err("null_fields must be a list of field names".into());
        };
        if map.contains_key(&name) {
            return Err(format!("'{}' is both set and listed in null_fields", name));
        }
        map.insert(name, Json::Null);
    }
    Ok(())
}
