//! Local state store.
//!
//! Layout under the state directory:
//!
//! ```text
//! index.json            address -> monitor id
//! monitors/<id>.json    declarative model of the last synced monitor
//! ```
//!
//! Files are written to a temporary sibling and renamed into place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use uptrace_core::MonitorData;

use crate::error::{CliError, CliResult};

pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn monitor_path(&self, id: &str) -> PathBuf {
        self.root.join("monitors").join(format!("{}.json", id))
    }

    /// Address to monitor id for everything under management.
    pub fn index(&self) -> CliResult<BTreeMap<String, String>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn get(&self, address: &str) -> CliResult<Option<MonitorData>> {
        let Some(id) = self.index()?.remove(address) else {
            return Ok(None);
        };
        let path = self.monitor_path(&id);
        if !path.exists() {
            return Err(CliError::State(format!(
                "index points '{}' at monitor {} but {} is missing",
                address,
                id,
                path.display()
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Record a synced state under `address`.
    pub fn put(&self, address: &str, state: &MonitorData) -> CliResult<()> {
        let id = state
            .remote_id()
            .ok_or_else(|| CliError::State(format!("state for '{}' has no monitor id", address)))?
            .to_string();

        let mut index = self.index()?;
        let previous = index.insert(address.to_string(), id.clone());

        write_atomic(&self.monitor_path(&id), &serde_json::to_vec_pretty(state)?)?;
        write_atomic(&self.index_path(), &serde_json::to_vec_pretty(&index)?)?;

        if let Some(old) = previous.filter(|old| *old != id) {
            remove_if_exists(&self.monitor_path(&old))?;
        }
        Ok(())
    }

    /// Forget an address. Returns the monitor id it pointed at.
    pub fn remove(&self, address: &str) -> CliResult<Option<String>> {
        let mut index = self.index()?;
        let Some(id) = index.remove(address) else {
            return Ok(None);
        };
        write_atomic(&self.index_path(), &serde_json::to_vec_pretty(&index)?)?;
        remove_if_exists(&self.monitor_path(&id))?;
        Ok(Some(id))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> CliResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> CliResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
