use std::{
    path::PathBuf,
    sync::{Mutex, OnceLock},
};

const CONFIG_HOME_ENV: &str = "MOULDTRACK_CONFIG_HOME";
const DISABLE_KEYRING_ENV: &str = "MOULDTRACK_DISABLE_KEYRING";

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Points the app directory at `path` and keeps the token out of the OS
/// keyring until dropped.
pub struct MouldtrackEnvGuard {
    previous: Vec<(&'static str, Option<String>)>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl MouldtrackEnvGuard {
    pub fn set_config_home(path: PathBuf) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let previous = vec![
            (CONFIG_HOME_ENV, std::env::var(CONFIG_HOME_ENV).ok()),
            (DISABLE_KEYRING_ENV, std::env::var(DISABLE_KEYRING_ENV).ok()),
        ];
        // SAFETY: tests run under a global lock to prevent concurrent env mutations.
        unsafe {
            std::env::set_var(CONFIG_HOME_ENV, path);
            std::env::set_var(DISABLE_KEYRING_ENV, "1");
        }
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for MouldtrackEnvGuard {
    fn drop(&mut self) {
        for (name, value) in self.previous.drain(..) {
            match value {
                // SAFETY: tests run under a global lock to prevent concurrent env mutations.
                Some(value) => unsafe { std::env::set_var(name, value) },
                // SAFETY: tests run under a global lock to prevent concurrent env mutations.
                None => unsafe { std::env::remove_var(name) },
            }
        }
    }
}
