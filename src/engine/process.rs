//! External engine process - hands the plan to AMBuild over stdin.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::core::plan::BuildPlan;
use crate::engine::{BuildEngine, EngineError};
use crate::util::hash::short;
use crate::util::process::{find_executable, ProcessBuilder};

/// Engine program looked up on PATH when none is configured.
pub const DEFAULT_PROGRAM: &str = "ambuild";

/// Vendored AMBuild checkout shipped inside the Metamod:Source tree.
pub const VENDORED_AMBUILD: &[&str] = &["vendor", "mmsource-2.0", "third_party", "ambuild"];

/// Environment variable carrying the plan fingerprint.
pub const FINGERPRINT_ENV: &str = "CS2KIT_PLAN_FINGERPRINT";

/// Runs an external program with the build plan as JSON on stdin.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessEngine {
    /// Use `program` exactly as given, without searching PATH.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        ProcessEngine {
            program: program.into(),
            args,
        }
    }

    /// Locate the engine program.
    ///
    /// Bare names are searched on PATH; anything containing a path
    /// separator is used as-is.
    pub fn locate(program: Option<&str>, args: Vec<String>) -> Result<Self, EngineError> {
        let name = program.unwrap_or(DEFAULT_PROGRAM);

        if Path::new(name).components().count() > 1 {
            return Ok(ProcessEngine::new(name, args));
        }

        let path = find_executable(name).ok_or_else(|| EngineError::NotFound {
            program: name.to_string(),
        })?;
        debug!("using build engine {}", path.display());
        Ok(ProcessEngine::new(path, args))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the command that configures `plan`.
    pub fn command(&self, plan: &BuildPlan) -> Result<ProcessBuilder, EngineError> {
        let json = plan.to_json()?;
        let fingerprint = plan.fingerprint()?;

        let mut cmd = ProcessBuilder::new(&self.program)
            .args(&self.args)
            .cwd(plan.build_dir())
            .env(FINGERPRINT_ENV, &fingerprint)
            .stdin(json);

        if let Some(pythonpath) = vendored_pythonpath(plan.source_dir()) {
            cmd = cmd.env("PYTHONPATH", pythonpath.to_string_lossy());
        }

        Ok(cmd)
    }
}

impl BuildEngine for ProcessEngine {
    fn configure(&mut self, plan: BuildPlan) -> Result<(), EngineError> {
        let cmd = self.command(&plan)?;
        let command = cmd.display_command();

        info!(
            "configuring {} in {} (plan {})",
            plan.sdk_list(),
            plan.build_dir().display(),
            short(cmd.get_env(FINGERPRINT_ENV).unwrap_or_default())
        );

        let status = cmd.status().map_err(|e| EngineError::Spawn {
            command: command.clone(),
            message: format!("{:#}", e),
        })?;

        if !status.success() {
            return Err(EngineError::Failed {
                command,
                code: status.code(),
            });
        }

        Ok(())
    }
}

/// `PYTHONPATH` with the vendored AMBuild prepended, if the checkout exists.
fn vendored_pythonpath(source_dir: &Path) -> Option<OsString> {
    let vendored: PathBuf = VENDORED_AMBUILD
        .iter()
        .fold(source_dir.to_path_buf(), |p, c| p.join(c));
    if !vendored.is_dir() {
        return None;
    }

    let mut paths = vec![vendored];
    if let Some(existing) = std::env::var_os("PYTHONPATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    std::env::join_paths(paths).ok()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::core::registry::OptionRegistry;
    use crate::resolver::{RawInput, Resolver};

    fn plan_in(dir: &Path) -> BuildPlan {
        let registry = OptionRegistry::standard().unwrap();
        Resolver::new(&registry, dir)
            .resolve(&RawInput::new().with_flag("enable-debug"))
            .unwrap()
    }

    #[test]
    fn test_command_shape() {
        let tmp = TempDir::new().unwrap();
        let plan = plan_in(tmp.path());
        let engine = ProcessEngine::new("/opt/ambuild", vec!["--plan-stdin".into()]);

        let cmd = engine.command(&plan).unwrap();
        assert_eq!(cmd.get_program(), Path::new("/opt/ambuild"));
        assert_eq!(cmd.get_args(), &["--plan-stdin".to_string()]);
        assert_eq!(cmd.get_cwd(), Some(tmp.path()));
        assert_eq!(
            cmd.get_env(FINGERPRINT_ENV),
            Some(plan.fingerprint().unwrap().as_str())
        );
        assert!(cmd.get_env("PYTHONPATH").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_command_rejects_plan_without_json_form() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let plan = plan_in(Path::new(OsStr::from_bytes(b"/work/\xff")));
        let engine = ProcessEngine::new("/opt/ambuild", Vec::new());

        assert!(matches!(
            engine.command(&plan),
            Err(EngineError::Serialize(_))
        ));
    }

    #[test]
    fn test_vendored_ambuild_is_prepended() {
        let tmp = TempDir::new().unwrap();
        let vendored = tmp
            .path()
            .join("vendor/mmsource-2.0/third_party/ambuild");
        fs::create_dir_all(&vendored).unwrap();

        let plan = plan_in(tmp.path());
        let cmd = ProcessEngine::new("ambuild", vec![]).command(&plan).unwrap();

        let pythonpath = cmd.get_env("PYTHONPATH").unwrap();
        let first = std::env::split_paths(pythonpath).next().unwrap();
        assert_eq!(first, vendored);
    }

    #[test]
    fn test_locate_path_is_used_verbatim() {
        let engine = ProcessEngine::locate(Some("./tools/ambuild"), vec![]).unwrap();
        assert_eq!(engine.program(), Path::new("./tools/ambuild"));
    }

    #[test]
    fn test_locate_missing_program() {
        let err = ProcessEngine::locate(Some("no-such-engine-cs2kit"), vec![]).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_configure_passes_plan_on_stdin() {
        let tmp = TempDir::new().unwrap();
        let plan = plan_in(tmp.path());
        let mut engine = ProcessEngine::new(
            "sh",
            vec!["-c".into(), "grep -q '\"debug_enabled\": true'".into()],
        );
        engine.configure(plan).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_configure_reports_engine_status() {
        let tmp = TempDir::new().unwrap();
        let plan = plan_in(tmp.path());
        let mut engine = ProcessEngine::new("sh", vec!["-c".into(), "cat >/dev/null; exit 7".into()]);

        let err = engine.configure(plan).unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }
}
