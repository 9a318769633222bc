use crate::error::{Error, Result};
use crate::launch::Launcher;
use crate::params::JobSpec;
use crate::render::render_script;
use std::fs;
use std::path::{Path, PathBuf};

/// What a successful materialization left behind.
#[derive(Debug, Clone)]
pub struct Materialized {
    pub script_path: PathBuf,
    pub record_path: PathBuf,
    pub script: String,
}

/// Validate and render without touching the filesystem.
pub fn preview(spec: &JobSpec) -> Result<String> {
    spec.check_required()?;
    Ok(render_script(spec))
}

/// Validate, render, persist, print, then hand the script to the launcher.
///
/// Nothing is written unless validation passes. An existing script or
/// parameter record with the same job name is overwritten. The launcher's
/// own exit status is not checked.
pub fn materialize(spec: &JobSpec, launcher: &dyn Launcher) -> Result<Materialized> {
    // 1) Validate.
    spec.check_required()?;

    // 2) Render (profiling line included).
    let script = render_script(spec);
    let record = serde_json::to_string_pretty(spec)? + "\n";

    // 3) Persist.
    let dir = PathBuf::from(&spec.job_directory);
    fs::create_dir_all(&dir).map_err(|source| Error::Persistence {
        path: dir.clone(),
        source,
    })?;

    let script_path = spec.script_path();
    let record_path = spec.record_path();
    persist_pair(&record_path, &record, &script_path, &script)?;
    tracing::info!(
        script = %script_path.display(),
        record = %record_path.display(),
        "wrote job files"
    );

    // 4) Emit.
    println!("{}", script);

    // 5) Launch.
    tracing::info!(launcher = %spec.launcher_command, "submitting job {}", spec.job_name);
    launcher.launch(&spec.launcher_command, &script_path)?;
    println!("Launched job");

    Ok(Materialized {
        script_path,
        record_path,
        script,
    })
}

/// Write both files to hidden siblings first, then rename them into place,
/// record before script. The script is never touched unless the record landed.
fn persist_pair(record_path: &Path, record: &str, script_path: &Path, script: &str) -> Result<()> {
    let record_tmp = staging_path(record_path);
    let script_tmp = staging_path(script_path);

    let staged = write_file(&record_tmp, record)
        .and_then(|()| write_file(&script_tmp, script))
        .and_then(|()| rename_file(&record_tmp, record_path))
        .and_then(|()| rename_file(&script_tmp, script_path));

    if staged.is_err() {
        let _ = fs::remove_file(&record_tmp);
        let _ = fs::remove_file(&script_tmp);
    }
    staged
}

/// `dir/run1.slurm` -> `dir/.run1.slurm.tmp`
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| Error::Persistence {
        path: path.to_path_buf(),
        source,
    })
}

fn rename_file(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|source| Error::Persistence {
        path: to.to_path_buf(),
        source,
    })
}
