//! Discovery and staging of the `pg_worker` binary for root test runs.

use super::BoxError;
use super::fs_utils::open_parent_dir;
use camino::{Utf8Path, Utf8PathBuf};
#[cfg(unix)]
use cap_std::fs::{Permissions, PermissionsExt};
use std::env;
use std::io::ErrorKind;
use std::sync::{Mutex, OnceLock};

const WORKER_NAME: &str = "pg_worker";

static STAGED_WORKER: OnceLock<Mutex<Option<Utf8PathBuf>>> = OnceLock::new();

/// Finds the worker built alongside the tests, then falls back to the
/// environment and `PATH`.
pub(super) fn locate_pg_worker_path() -> Option<Utf8PathBuf> {
    option_env!("CARGO_BIN_EXE_pg_worker")
        .map(Utf8PathBuf::from)
        .filter(|path| path.is_file())
        .or_else(worker_from_env)
        .or_else(worker_near_target)
        .or_else(worker_in_path)
}

/// Copies the worker into the temp directory with world-executable mode so
/// the demoted `nobody` user can run it.
pub(super) fn prepare_pg_worker(worker: &Utf8Path) -> Result<Utf8PathBuf, BoxError> {
    let mut staged = STAGED_WORKER
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(path) = staged.as_ref() {
        return Ok(path.clone());
    }

    let temp_dir = Utf8PathBuf::try_from(env::temp_dir())?;
    let destination = temp_dir.join(format!("{WORKER_NAME}_{}", std::process::id()));
    let (source_dir, source_name) = open_parent_dir(worker)?;
    let (destination_dir, destination_name) = open_parent_dir(&destination)?;
    match destination_dir.remove_file(destination_name) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(Box::new(err)),
    }
    source_dir.copy(source_name, &destination_dir, destination_name)?;
    #[cfg(unix)]
    destination_dir.set_permissions(destination_name, Permissions::from_mode(0o755))?;

    *staged = Some(destination.clone());
    Ok(destination)
}

fn worker_from_env() -> Option<Utf8PathBuf> {
    let path = utf8(env::var_os("PG_EMBEDDED_WORKER")?)?;
    (path.file_stem() == Some(WORKER_NAME) && path.is_file()).then_some(path)
}

fn worker_near_target() -> Option<Utf8PathBuf> {
    let exe = utf8(env::current_exe().ok()?.into_os_string())?;
    let target_dir = exe.parent()?.parent()?;
    let candidate = target_dir.join(WORKER_NAME);
    candidate.is_file().then_some(candidate)
}

fn worker_in_path() -> Option<Utf8PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .filter_map(|entry| utf8(entry.into_os_string()))
        .map(|dir| dir.join(WORKER_NAME))
        .find(|candidate| candidate.is_file())
}

fn utf8(value: std::ffi::OsString) -> Option<Utf8PathBuf> {
    value.into_string().ok().map(Utf8PathBuf::from)
}

#[cfg(test)]
mod tests {
    //! Worker discovery order.

    use super::{WORKER_NAME, worker_from_env, worker_in_path};
    use crate::test_helpers::EnvVarGuard;
    use camino::Utf8PathBuf;
    use rstest::rstest;
    use std::ffi::OsString;

    fn scratch_worker(prefix: &str, file_name: &str) -> Utf8PathBuf {
        let base = Utf8PathBuf::try_from(std::env::temp_dir()).expect("temp dir should be UTF-8");
        let dir = base.join(format!("{prefix}_{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).expect("scratch dir should be created");
        let worker = dir.join(file_name);
        std::fs::write(&worker, "#!/bin/sh\nexit 0\n").expect("worker stub should be written");
        worker
    }

    #[rstest]
    fn path_lookup_finds_a_worker() {
        let worker = scratch_worker("codline_worker_path", WORKER_NAME);
        let dir = worker.parent().expect("worker should have a parent");
        let guard = EnvVarGuard::set_many(&[(
            OsString::from("PATH"),
            Some(OsString::from(dir.as_str())),
        )]);

        let found = worker_in_path();

        drop(guard);
        assert_eq!(found, Some(worker));
    }

    #[rstest]
    #[case(WORKER_NAME, true)]
    #[case("postgres", false)]
    fn env_override_must_name_the_worker(#[case] file_name: &str, #[case] accepted: bool) {
        let worker = scratch_worker("codline_worker_env", file_name);
        let guard = EnvVarGuard::set_many(&[(
            OsString::from("PG_EMBEDDED_WORKER"),
            Some(OsString::from(worker.as_str())),
        )]);

        let found = worker_from_env();

        drop(guard);
        assert_eq!(found.is_some(), accepted);
    }
}
