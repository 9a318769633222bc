use crate::params::{JobSpec, JobVariant};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

/// Rendezvous port exported to every job.
pub const MASTER_PORT: u16 = 12340;

/// Directives plus environment setup shared by both variants.
///
/// Placeholders are substituted in a single pass, so `$(...)` and `$VAR` in the
/// shell body are left for the job to evaluate and substituted values are
/// never rescanned.
const TEMPLATE: &str = r#"#!/bin/bash
#SBATCH --job-name=__JOB_NAME__
#SBATCH --nodes=__NODES__
#SBATCH --ntasks-per-node=__TASKS_PER_NODE__
#SBATCH --gpus=__GPUS__
#SBATCH --cpus-per-task=__CPUS__
#SBATCH --mem=__MEMORY__
#SBATCH --time=__TIME__
#SBATCH --partition=__PARTITION__
#SBATCH --output=__OUTPUT_LOG__

export WORLD_SIZE=__WORLD_SIZE__
export MASTER_PORT=__MASTER_PORT__
master_addr=$(scontrol show hostnames "$SLURM_JOB_NODELIST" | head -n 1)
export MASTER_ADDR=$master_addr
export MLFLOW_TRACKING_URI=__TRACKING_URI__

eval "$(conda shell.bash hook)"
conda activate __CONDA_ENV__
"#;

const RUN_LINE: &str = "srun python __ENTRY_FILE__ --config __CONFIG_PATH__\n";

const PROFILE_LINE: &str =
    "srun kernprof -l -o __PROFILE_REPORT__ __ENTRY_FILE__ --config __CONFIG_PATH__\n";

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"__([A-Z]+(?:_[A-Z]+)*)__").expect("placeholder pattern is valid")
});

/// Render the submission script for `spec`. Pure; no validation.
pub fn render_script(spec: &JobSpec) -> String {
    let mut out = substitute(TEMPLATE, spec);
    if spec.variant() == JobVariant::Extended {
        let tail = if spec.enable_profiling {
            PROFILE_LINE
        } else {
            RUN_LINE
        };
        out.push_str(&substitute(tail, spec));
    }
    out
}

/// Where the profiler writes its report: the output log with a `.lprof` extension.
pub fn profile_report_path(spec: &JobSpec) -> String {
    Path::new(&spec.output_log_path)
        .with_extension("lprof")
        .to_string_lossy()
        .into_owned()
}

/// Single-quote `value` for a shell word; embedded quotes become `'\''`.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn substitute(template: &str, spec: &JobSpec) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "JOB_NAME" => spec.job_name.clone(),
            "NODES" => spec.node_count.to_string(),
            "TASKS_PER_NODE" => spec.tasks_per_node.to_string(),
            "GPUS" => spec.gpu_count.to_string(),
            "CPUS" => spec.cpu_count.to_string(),
            "MEMORY" => spec.memory.clone(),
            "TIME" => spec.walltime.clone(),
            "PARTITION" => spec.partition.clone(),
            "OUTPUT_LOG" => spec.output_log_path.clone(),
            "WORLD_SIZE" => spec.world_size().to_string(),
            "MASTER_PORT" => MASTER_PORT.to_string(),
            "TRACKING_URI" => shell_quote(&spec.tracking_uri),
            "CONDA_ENV" => shell_quote(&spec.environment_name),
            "ENTRY_FILE" => spec.entry_file.clone().unwrap_or_default(),
            "CONFIG_PATH" => spec.config_path.clone().unwrap_or_default(),
            "PROFILE_REPORT" => profile_report_path(spec),
            _ => caps[0].to_string(),
        })
        .into_owned()
}
