//! The job parameter record and its built-in defaults.

use crate::error::{Error, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Resolved parameters for one submission. Built once per run, then only read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSpec {
    pub job_name: String,
    pub node_count: u32,
    pub gpu_count: u32,
    pub cpu_count: u32,
    pub tasks_per_node: u32,
    /// Passed to `--mem` untouched, so any unit suffix Slurm accepts works.
    pub memory: String,
    pub walltime: String,
    pub partition: String,
    pub launcher_command: String,
    pub output_log_path: String,
    pub environment_name: String,
    pub job_directory: String,
    pub entry_file: Option<String>,
    pub config_path: Option<String>,
    pub tracking_uri: String,
    pub enable_profiling: bool,
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            job_name: "toy".to_string(),
            node_count: 1,
            gpu_count: 1,
            cpu_count: 16,
            tasks_per_node: 1,
            memory: "63000".to_string(),
            walltime: String::new(),
            partition: "main".to_string(),
            launcher_command: "sbatch".to_string(),
            output_log_path: String::new(),
            environment_name: String::new(),
            job_directory: "./slurm-jobs/".to_string(),
            entry_file: None,
            config_path: None,
            tracking_uri: "localhost:5000".to_string(),
            enable_profiling: false,
        }
    }
}

/// Which template body a spec renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobVariant {
    /// Environment setup only; the user adds their own run line.
    Basic,
    /// Also runs `entry_file` with `config_path`, optionally under the profiler.
    Extended,
}

impl JobSpec {
    pub fn variant(&self) -> JobVariant {
        if self.entry_file.is_some() || self.config_path.is_some() || self.enable_profiling {
            JobVariant::Extended
        } else {
            JobVariant::Basic
        }
    }

    /// Total number of ranks across the allocation.
    pub fn world_size(&self) -> u64 {
        u64::from(self.node_count) * u64::from(self.tasks_per_node)
    }

    /// `{job_directory}/{job_name}.slurm`
    pub fn script_path(&self) -> PathBuf {
        PathBuf::from(&self.job_directory).join(format!("{}.slurm", self.job_name))
    }

    /// `{job_directory}/{job_name}.json`
    pub fn record_path(&self) -> PathBuf {
        PathBuf::from(&self.job_directory).join(format!("{}.json", self.job_name))
    }

    /// Fail on the first empty field that materialization depends on, then on
    /// values that would escape the job directory or break a script line.
    pub fn check_required(&self) -> Result<()> {
        self.check_present()?;

        let name = self.job_name.as_str();
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(Error::InvalidValue {
                field: "job_name",
                reason: "must be a file name, not a path",
            });
        }

        let rendered: [(&'static str, &str); 9] = [
            ("job_name", name),
            ("memory", self.memory.as_str()),
            ("walltime", self.walltime.as_str()),
            ("partition", self.partition.as_str()),
            ("output_log_path", self.output_log_path.as_str()),
            ("environment_name", self.environment_name.as_str()),
            ("tracking_uri", self.tracking_uri.as_str()),
            ("entry_file", self.entry_file.as_deref().unwrap_or("")),
            ("config_path", self.config_path.as_deref().unwrap_or("")),
        ];
        for (field, value) in rendered {
            if value.contains(['\n', '\r']) {
                return Err(Error::InvalidValue {
                    field,
                    reason: "must not contain line breaks",
                });
            }
        }
        Ok(())
    }

    fn check_present(&self) -> Result<()> {
        let mut required: Vec<(&'static str, &str)> = vec![
            ("walltime", self.walltime.as_str()),
            ("output_log_path", self.output_log_path.as_str()),
            ("environment_name", self.environment_name.as_str()),
        ];
        if self.variant() == JobVariant::Extended {
            required.push(("entry_file", self.entry_file.as_deref().unwrap_or("")));
            required.push(("config_path", self.config_path.as_deref().unwrap_or("")));
        }
        required.push(("job_name", self.job_name.as_str()));
        required.push(("launcher_command", self.launcher_command.as_str()));

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::MissingRequiredField { field });
            }
        }
        Ok(())
    }
}
