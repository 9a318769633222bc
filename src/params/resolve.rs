//! Closed merge of overrides onto a default `JobSpec`.
//!
//! Every override key must name a field (or one of the short aliases kept
//! for existing launch scripts); every value must coerce to that field's type.
//! Required-field checks are not done here.

use crate::error::{Error, Result};
use crate::params::job::JobSpec;
use crate::params::overrides::{OverrideValue, Overrides};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    JobName,
    NodeCount,
    GpuCount,
    CpuCount,
    TasksPerNode,
    Memory,
    Walltime,
    Partition,
    LauncherCommand,
    OutputLogPath,
    EnvironmentName,
    JobDirectory,
    EntryFile,
    ConfigPath,
    TrackingUri,
    EnableProfiling,
}

impl Field {
    const ALL: [Field; 16] = [
        Field::JobName,
        Field::NodeCount,
        Field::GpuCount,
        Field::CpuCount,
        Field::TasksPerNode,
        Field::Memory,
        Field::Walltime,
        Field::Partition,
        Field::LauncherCommand,
        Field::OutputLogPath,
        Field::EnvironmentName,
        Field::JobDirectory,
        Field::EntryFile,
        Field::ConfigPath,
        Field::TrackingUri,
        Field::EnableProfiling,
    ];

    fn key(self) -> &'static str {
        match self {
            Field::JobName => "job_name",
            Field::NodeCount => "node_count",
            Field::GpuCount => "gpu_count",
            Field::CpuCount => "cpu_count",
            Field::TasksPerNode => "tasks_per_node",
            Field::Memory => "memory",
            Field::Walltime => "walltime",
            Field::Partition => "partition",
            Field::LauncherCommand => "launcher_command",
            Field::OutputLogPath => "output_log_path",
            Field::EnvironmentName => "environment_name",
            Field::JobDirectory => "job_directory",
            Field::EntryFile => "entry_file",
            Field::ConfigPath => "config_path",
            Field::TrackingUri => "tracking_uri",
            Field::EnableProfiling => "enable_profiling",
        }
    }

    fn alias(self) -> Option<&'static str> {
        match self {
            Field::NodeCount => Some("nodes"),
            Field::GpuCount => Some("ngpu"),
            Field::CpuCount => Some("ncpu"),
            Field::TasksPerNode => Some("ntasks"),
            Field::Memory => Some("mem"),
            Field::Walltime => Some("time"),
            Field::LauncherCommand => Some("launcher"),
            Field::OutputLogPath => Some("output_log"),
            Field::EnvironmentName => Some("conda_env"),
            Field::JobDirectory => Some("job_dir"),
            Field::TrackingUri => Some("mlflow_uri"),
            Field::EnableProfiling => Some("profile"),
            _ => None,
        }
    }

    fn lookup(key: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|f| f.key() == key || f.alias() == Some(key))
    }

    fn apply(self, spec: &mut JobSpec, key: &str, value: &OverrideValue) -> Result<()> {
        match self {
            Field::JobName => spec.job_name = text(key, value)?,
            Field::NodeCount => spec.node_count = count(key, value, 1)?,
            Field::GpuCount => spec.gpu_count = count(key, value, 0)?,
            Field::CpuCount => spec.cpu_count = count(key, value, 1)?,
            Field::TasksPerNode => spec.tasks_per_node = count(key, value, 1)?,
            Field::Memory => spec.memory = text(key, value)?,
            Field::Walltime => spec.walltime = text(key, value)?,
            Field::Partition => spec.partition = text(key, value)?,
            Field::LauncherCommand => spec.launcher_command = text(key, value)?,
            Field::OutputLogPath => spec.output_log_path = text(key, value)?,
            Field::EnvironmentName => spec.environment_name = text(key, value)?,
            Field::JobDirectory => spec.job_directory = text(key, value)?,
            Field::EntryFile => spec.entry_file = optional_text(key, value)?,
            Field::ConfigPath => spec.config_path = optional_text(key, value)?,
            Field::TrackingUri => spec.tracking_uri = text(key, value)?,
            Field::EnableProfiling => spec.enable_profiling = flag(key, value)?,
        }
        Ok(())
    }
}

/// Merge `overrides` onto `defaults`, in order.
pub fn resolve(defaults: JobSpec, overrides: &Overrides) -> Result<JobSpec> {
    let mut spec = defaults;
    for (key, value) in overrides.iter() {
        let field = Field::lookup(key).ok_or_else(|| Error::UnknownField {
            key: key.to_string(),
        })?;
        field.apply(&mut spec, key, value)?;
    }
    Ok(spec)
}

fn text(key: &str, value: &OverrideValue) -> Result<String> {
    match value {
        OverrideValue::Text(s) => Ok(s.clone()),
        OverrideValue::Integer(n) => Ok(n.to_string()),
        OverrideValue::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::type_mismatch(key, "string", value)),
    }
}

fn optional_text(key: &str, value: &OverrideValue) -> Result<Option<String>> {
    match value {
        OverrideValue::Null => Ok(None),
        _ => text(key, value).map(Some),
    }
}

fn count(key: &str, value: &OverrideValue, min: u32) -> Result<u32> {
    let expected = if min == 0 {
        "integer >= 0"
    } else {
        "integer >= 1"
    };
    let n = match value {
        OverrideValue::Integer(n) => *n,
        OverrideValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::type_mismatch(key, expected, value))?,
        _ => return Err(Error::type_mismatch(key, expected, value)),
    };
    u32::try_from(n)
        .ok()
        .filter(|n| *n >= min)
        .ok_or_else(|| Error::type_mismatch(key, expected, value))
}

fn flag(key: &str, value: &OverrideValue) -> Result<bool> {
    match value {
        OverrideValue::Bool(b) => Ok(*b),
        OverrideValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(Error::type_mismatch(key, "boolean", value)),
        },
        _ => Err(Error::type_mismatch(key, "boolean", value)),
    }
}
