use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

const ENV_KEYS: &[&str] = &[
    "PHOTOBRIDGE_SAVE_DIR",
    "PHOTOBRIDGE_PORT",
    "PHOTOBRIDGE_BIND_SCOPE",
    "PHOTOBRIDGE_PROBE_TARGET",
    "PHOTOBRIDGE_MAX_UPLOAD_BYTES",
    "PHOTOBRIDGE_QR_PREFIX",
];

fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

struct EnvRestore {
    saved: Vec<(&'static str, Option<std::ffi::OsString>)>,
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

/// Runs `f` with a config file holding `config_toml`, the given env vars set,
/// and every other `PHOTOBRIDGE_*` var cleared. Passes the config file path.
pub fn with_config_env<T>(
    config_toml: &str,
    env: &[(&str, &str)],
    f: impl FnOnce(&std::path::Path) -> T,
) -> T {
    let _guard = env_lock().lock().unwrap_or_else(|e| e.into_inner());
    let temp_dir = TempDir::new().expect("temp dir");
    let config_file = temp_dir.path().join("config.toml");
    std::fs::write(&config_file, config_toml).expect("write config");

    let restore = EnvRestore {
        saved: ENV_KEYS
            .iter()
            .map(|key| (*key, std::env::var_os(key)))
            .collect(),
    };

    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
    for (key, value) in env {
        std::env::set_var(key, value);
    }

    let result = f(&config_file);
    drop(restore);
    result
}
