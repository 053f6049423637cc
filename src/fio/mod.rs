//! fio job configuration.
//!
//! [`FioArgs`] owns the option mapping for one fio job and renders it into
//! the job file fio consumes. Volume targeting goes through
//! [`FioArgs::add_volumes_to_exercise`] only; the `filename` option is
//! reserved so that the service, not the caller, controls which devices a
//! job touches.

pub mod runner;

pub use runner::FioRunner;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::types::VolumeId;

/// The fio option that selects which volumes a job exercises.
pub const VOLUME_TARGET_KEY: &str = "filename";

/// Mutable fio job configuration, built from request-supplied JSON.
#[derive(Debug, Clone, Default)]
pub struct FioArgs {
    args: BTreeMap<String, Value>,
    volumes: BTreeSet<VolumeId>,
}

impl FioArgs {
    /// Parse a raw JSON blob into a job configuration.
    ///
    /// The blob must decode to a flat object. Fails if it is not well-formed
    /// JSON, or if it already contains the reserved `filename` option.
    pub fn parse(raw: &str) -> Result<Self> {
        let args: serde_json::Map<String, Value> =
            serde_json::from_str(raw).map_err(|e| Error::BadFioArgs(e.to_string()))?;
        if args.contains_key(VOLUME_TARGET_KEY) {
            return Err(Error::ReservedArgument {
                key: VOLUME_TARGET_KEY,
            });
        }
        Ok(Self {
            args: args.into_iter().collect(),
            volumes: BTreeSet::new(),
        })
    }

    /// Merge volumes into the exercise target set.
    ///
    /// Set union; repeated calls with overlapping sets never duplicate
    /// entries in the rendered target list.
    pub fn add_volumes_to_exercise(&mut self, volumes: &BTreeSet<VolumeId>) {
        self.volumes.extend(volumes.iter().cloned());
    }

    /// Set or overwrite an arbitrary scalar option.
    pub fn add_argument(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.args.insert(key.into(), value.into());
    }

    /// Materialize the current mapping into a scoped job file.
    pub fn job_file(&self) -> Result<JobFile> {
        JobFile::materialize(self)
    }

    fn render(&self) -> String {
        let mut out = String::from("[job0]\n");
        if !self.volumes.is_empty() {
            let targets: Vec<&str> = self.volumes.iter().map(VolumeId::as_str).collect();
            out.push_str(&format!("{VOLUME_TARGET_KEY}={}\n", targets.join(":")));
        }
        for (key, value) in &self.args {
            out.push_str(&format!("{key}={}\n", render_value(value)));
        }
        out
    }
}

impl fmt::Display for FioArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut all: serde_json::Map<String, Value> =
            self.args.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        if !self.volumes.is_empty() {
            let targets: Vec<String> = self.volumes.iter().map(|v| v.as_str().to_string()).collect();
            all.insert(VOLUME_TARGET_KEY.to_string(), Value::from(targets));
        }
        write!(f, "{}", Value::Object(all))
    }
}

/// Render a scalar in its natural textual form: strings unquoted,
/// everything else as its JSON text.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A rendered fio job file scoped to one run.
///
/// The underlying temporary file is removed when this value drops, on
/// success and failure paths alike.
pub struct JobFile {
    file: NamedTempFile,
}

impl JobFile {
    fn materialize(args: &FioArgs) -> Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(args.render().as_bytes())?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
