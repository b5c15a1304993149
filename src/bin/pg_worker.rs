//! Runs embedded `PostgreSQL` lifecycle steps on behalf of a root test runner.
//!
//! ```text
//! pg_worker <setup|start|stop> <payload.json>
//! ```
//!
//! The payload is a serialised `WorkerPayload`: cluster settings plus the
//! environment overrides to apply. `PostgreSQL` refuses to run as root, so the
//! worker re-executes itself as `nobody` before touching the cluster.

#[cfg(unix)]
use camino::{Utf8Path, Utf8PathBuf};
#[cfg(unix)]
use nix::unistd::{Uid, User, initgroups, setgid, setuid};
#[cfg(unix)]
use pg_embedded_setup_unpriv::ambient_dir_and_path;
#[cfg(unix)]
use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
#[cfg(unix)]
use postgresql_embedded::{PostgreSQL, Status};
#[cfg(unix)]
use std::{env, ffi::CString, io, io::Read, process::Command};
#[cfg(unix)]
use thiserror::Error;

#[cfg(unix)]
const REEXEC_MARKER: &str = "PG_WORKER_REEXEC";
#[cfg(unix)]
const TRUSTED_PATH: &str = "/usr/sbin:/usr/bin:/sbin:/bin";
#[cfg(unix)]
const DEMOTED_USER: &str = "nobody";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(unix)]
#[derive(Debug, Error)]
enum WorkerError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("failed to read worker payload: {0}")]
    PayloadRead(#[source] BoxError),
    #[error("failed to parse worker payload: {0}")]
    PayloadParse(#[source] serde_json::Error),
    #[error("invalid cluster settings: {0}")]
    Settings(String),
    #[error("runtime init failed: {0}")]
    Runtime(#[source] io::Error),
    #[error("failed to drop privileges: {0}")]
    PrivilegeDrop(String),
    #[error("postgres {operation} failed: {message}")]
    Postgres {
        operation: &'static str,
        message: String,
    },
}

#[cfg(unix)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Setup,
    Start,
    Stop,
}

#[cfg(unix)]
impl Operation {
    fn parse(arg: &str) -> Result<Self, WorkerError> {
        match arg {
            "setup" => Ok(Self::Setup),
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            other => Err(WorkerError::InvalidArgs(format!(
                "unknown operation '{other}'; expected setup, start, or stop"
            ))),
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }
}

#[cfg(unix)]
fn main() -> Result<(), BoxError> {
    let args = env::args_os()
        .map(|arg| {
            arg.into_string()
                .map(Utf8PathBuf::from)
                .map_err(|_| WorkerError::InvalidArgs("argument is not valid UTF-8".to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    reexec_as_demoted_user(&args)?;
    run(&args).map_err(Into::into)
}

#[cfg(not(unix))]
fn main() -> Result<(), BoxError> {
    Err("pg_worker is only supported on Unix platforms".into())
}

#[cfg(unix)]
fn run(args: &[Utf8PathBuf]) -> Result<(), WorkerError> {
    let (operation, payload_path) = parse_args(args)?;
    let payload = load_payload(payload_path)?;
    drop_privileges()?;
    let settings = payload
        .settings
        .into_settings()
        .map_err(|err| WorkerError::Settings(err.to_string()))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(WorkerError::Runtime)?;
    apply_environment(&payload.environment);

    let mut postgres = PostgreSQL::new(settings);
    let failed = |err: postgresql_embedded::Error| WorkerError::Postgres {
        operation: operation.as_str(),
        message: err.to_string(),
    };
    runtime.block_on(async {
        if operation == Operation::Stop {
            return postgres.stop().await.map_err(failed);
        }
        if operation == Operation::Setup {
            postgres.setup().await.map_err(failed)?;
        }
        if !matches!(postgres.status(), Status::Started) {
            postgres.start().await.map_err(failed)?;
        }
        Ok(())
    })?;
    // The server must outlive this process, so the handle is never dropped.
    std::mem::forget(postgres);
    Ok(())
}

#[cfg(unix)]
fn parse_args(args: &[Utf8PathBuf]) -> Result<(Operation, &Utf8Path), WorkerError> {
    match args {
        [_, operation, payload] => Ok((Operation::parse(operation.as_str())?, payload.as_path())),
        [_, _, _, extra, ..] => Err(WorkerError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        ))),
        _ => Err(WorkerError::InvalidArgs(
            "usage: pg_worker <setup|start|stop> <payload.json>".to_owned(),
        )),
    }
}

#[cfg(unix)]
fn load_payload(path: &Utf8Path) -> Result<WorkerPayload, WorkerError> {
    let read = || -> Result<Vec<u8>, BoxError> {
        let (dir, relative) = ambient_dir_and_path(path)?;
        let mut bytes = Vec::new();
        dir.open(relative.as_std_path())?.read_to_end(&mut bytes)?;
        Ok(bytes)
    };
    let bytes = read().map_err(WorkerError::PayloadRead)?;
    serde_json::from_slice(&bytes).map_err(WorkerError::PayloadParse)
}

/// Re-runs this binary as the demoted user and exits with its status.
#[cfg(unix)]
fn reexec_as_demoted_user(args: &[Utf8PathBuf]) -> Result<(), WorkerError> {
    if !Uid::effective().is_root() || env::var_os(REEXEC_MARKER).is_some() {
        return Ok(());
    }
    let exe = env::current_exe()
        .map_err(WorkerError::Runtime)?
        .into_os_string()
        .into_string()
        .map(Utf8PathBuf::from)
        .map_err(|_| WorkerError::Runtime(io::Error::other("executable path is not valid UTF-8")))?;
    let forwarded = args.get(1..).unwrap_or_default();

    let status = match Command::new("runuser")
        .args(["-u", DEMOTED_USER, "--"])
        .arg(exe.as_std_path())
        .args(forwarded.iter().map(|arg| arg.as_std_path()))
        .env(REEXEC_MARKER, "1")
        .env("PATH", TRUSTED_PATH)
        .status()
    {
        Ok(status) => status,
        Err(err) if err.kind() == io::ErrorKind::NotFound => Command::new("/bin/su")
            .args(["-s", "/bin/sh", DEMOTED_USER, "-c"])
            .arg(su_command(&exe, forwarded))
            .env("PATH", TRUSTED_PATH)
            .status()
            .map_err(|su_err| WorkerError::PrivilegeDrop(su_err.to_string()))?,
        Err(err) => return Err(WorkerError::PrivilegeDrop(err.to_string())),
    };
    std::process::exit(status.code().unwrap_or(1));
}

#[cfg(unix)]
fn su_command(exe: &Utf8Path, args: &[Utf8PathBuf]) -> String {
    let mut command = format!("{REEXEC_MARKER}=1 exec {}", shell_quote(exe.as_str()));
    for arg in args {
        command.push(' ');
        command.push_str(&shell_quote(arg.as_str()));
    }
    command
}

/// Wraps `value` in single quotes for a POSIX shell.
#[cfg(unix)]
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

#[cfg(unix)]
fn drop_privileges() -> Result<(), WorkerError> {
    if !Uid::effective().is_root() {
        return Ok(());
    }
    let denied = |err: nix::Error| WorkerError::PrivilegeDrop(err.to_string());
    let user = User::from_name(DEMOTED_USER)
        .map_err(denied)?
        .ok_or_else(|| WorkerError::PrivilegeDrop(format!("user '{DEMOTED_USER}' not found")))?;
    let name = CString::new(user.name.clone())
        .map_err(|err| WorkerError::PrivilegeDrop(err.to_string()))?;
    initgroups(&name, user.gid).map_err(denied)?;
    setgid(user.gid).map_err(denied)?;
    setuid(user.uid).map_err(denied)?;

    // SAFETY: the worker is single-threaded at this point.
    unsafe {
        env::set_var("HOME", &user.dir);
        env::set_var("USER", &user.name);
        env::set_var("LOGNAME", &user.name);
    }
    Ok(())
}

#[cfg(unix)]
fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
    for (key, value) in environment {
        // SAFETY: the worker is single-threaded and owns its environment.
        unsafe {
            match value {
                Some(secret) => env::set_var(key, secret.expose()),
                None => env::remove_var(key),
            }
        }
    }
}
