use std::path::{Path, PathBuf};

use super::{Session, SessionStore, SessionStoreError};
use crate::app_dirs;

const KEYRING_SERVICE: &str = "mouldtrack";
const KEYRING_KEY: &str = "access_token";
const PROFILE_FILE_NAME: &str = "session.toml";
const DISABLE_KEYRING_ENV: &str = "MOULDTRACK_DISABLE_KEYRING";

/// Session store backed by the OS keyring.
///
/// The token goes to the keyring when one is available and to an encrypted
/// file under `secrets/` otherwise. Profile fields live in `session.toml`
/// next to the config file; they are not secret.
#[derive(Clone, Debug)]
pub struct KeyringSessionStore {
    root: PathBuf,
    secrets_dir: PathBuf,
}

impl KeyringSessionStore {
    pub fn new() -> Result<Self, SessionStoreError> {
        Ok(Self {
            root: app_dirs::app_root_dir()?,
            secrets_dir: app_dirs::secrets_dir()?,
        })
    }

    /// Store rooted at an explicit directory.
    pub fn at(root: impl Into<PathBuf>) -> Result<Self, SessionStoreError> {
        let root = root.into();
        let secrets_dir = root.join("secrets");
        std::fs::create_dir_all(&secrets_dir)?;
        Ok(Self { root, secrets_dir })
    }

    fn read(&self) -> Result<Option<Session>, SessionStoreError> {
        let token = match self.try_keyring_get()? {
            Some(token) => Some(token),
            None => self.fallback_get()?,
        };
        let Some(token) = token.filter(|token| !token.trim().is_empty()) else {
            return Ok(None);
        };
        let mut session = self.read_profile()?.unwrap_or_else(|| Session::new(""));
        session.token = token;
        Ok(Some(session))
    }

    fn profile_path(&self) -> PathBuf {
        self.root.join(PROFILE_FILE_NAME)
    }

    fn read_profile(&self) -> Result<Option<Session>, SessionStoreError> {
        let path = self.profile_path();
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)?;
        toml::from_str(&text)
            .map(Some)
            .map_err(|err| SessionStoreError::Decode(format!("{}: {err}", path.display())))
    }

    fn write_profile(&self, session: &Session) -> Result<(), SessionStoreError> {
        let text = toml::to_string(session)?;
        write_private_file(&self.profile_path(), text.as_bytes())
    }

    fn try_keyring_get(&self) -> Result<Option<String>, SessionStoreError> {
        if keyring_disabled() {
            return Ok(None);
        }
        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_KEY)
            .map_err(|err| SessionStoreError::Unavailable(err.to_string()))?;
        match entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => {
                tracing::debug!("Keyring read failed, trying file fallback: {err}");
                Ok(None)
            }
        }
    }

    fn try_keyring_set(&self, token: &str) -> Result<(), SessionStoreError> {
        if keyring_disabled() {
            return Err(SessionStoreError::Unavailable("keyring disabled".into()));
        }
        let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_KEY)
            .map_err(|err| SessionStoreError::Unavailable(err.to_string()))?;
        entry
            .set_password(token)
            .map_err(|err| SessionStoreError::Unavailable(err.to_string()))
    }

    fn try_keyring_delete(&self) {
        if keyring_disabled() {
            return;
        }
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, KEYRING_KEY) {
            let _ = entry.delete_credential();
        }
    }

    fn fallback_token_path(&self) -> PathBuf {
        self.secrets_dir.join("access_token.bin")
    }

    fn fallback_key_path(&self) -> PathBuf {
        self.secrets_dir.join("access_token.key")
    }

    fn fallback_get(&self) -> Result<Option<String>, SessionStoreError> {
        let token_path = self.fallback_token_path();
        if !token_path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(token_path)?;
        if data.len() < 12 {
            return Err(SessionStoreError::Decode("token file too short".into()));
        }
        let (nonce, ciphertext) = data.split_at(12);
        let key_bytes = std::fs::read(self.fallback_key_path())?;
        if key_bytes.len() != 32 {
            return Err(SessionStoreError::Decode("token key invalid".into()));
        }
        let plaintext = decrypt(&key_bytes, nonce, ciphertext)?;
        let token = String::from_utf8(plaintext)
            .map_err(|err| SessionStoreError::Decode(err.to_string()))?;
        Ok(Some(token))
    }

    fn fallback_set(&self, token: &str) -> Result<(), SessionStoreError> {
        let key_path = self.fallback_key_path();
        let key_bytes = if key_path.exists() {
            std::fs::read(&key_path)?
        } else {
            let bytes = random_bytes(32)?;
            write_private_file(&key_path, &bytes)?;
            bytes
        };
        if key_bytes.len() != 32 {
            return Err(SessionStoreError::Decode("token key invalid".into()));
        }
        let nonce = random_bytes(12)?;
        let ciphertext = encrypt(&key_bytes, &nonce, token.as_bytes())?;
        let mut payload = Vec::with_capacity(nonce.len() + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        write_private_file(&self.fallback_token_path(), &payload)
    }

    fn fallback_delete(&self) {
        let _ = std::fs::remove_file(self.fallback_token_path());
        let _ = std::fs::remove_file(self.fallback_key_path());
    }
}

impl SessionStore for KeyringSessionStore {
    fn get(&self) -> Option<Session> {
        match self.read() {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!("Stored session unreadable, treating as logged out: {err}");
                None
            }
        }
    }

    fn set(&self, session: Session) -> Result<(), SessionStoreError> {
        let token = session.token.trim();
        if token.is_empty() {
            return self.clear();
        }
        if self.try_keyring_set(token).is_ok() {
            self.fallback_delete();
        } else {
            self.fallback_set(token)?;
        }
        self.write_profile(&session)
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        self.try_keyring_delete();
        self.fallback_delete();
        match std::fs::remove_file(self.profile_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn keyring_disabled() -> bool {
    std::env::var(DISABLE_KEYRING_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn random_bytes(len: usize) -> Result<Vec<u8>, SessionStoreError> {
    let mut out = vec![0u8; len];
    use rand::TryRngCore;
    rand::rngs::OsRng
        .try_fill_bytes(&mut out)
        .map_err(|err| SessionStoreError::Unavailable(err.to_string()))?;
    Ok(out)
}

fn write_private_file(path: &Path, bytes: &[u8]) -> Result<(), SessionStoreError> {
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(path)?;
    file.write_all(bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600));
    }
    Ok(())
}

fn encrypt(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, SessionStoreError> {
    use chacha20poly1305::aead::{Aead, KeyInit};
    let cipher = chacha20poly1305::ChaCha20Poly1305::new_from_slice(key)
        .map_err(|err| SessionStoreError::Crypto(err.to_string()))?;
    let nonce = chacha20poly1305::Nonce::from_slice(nonce);
    cipher
        .encrypt(nonce, plaintext)
        .map_err(|err| SessionStoreError::Crypto(err.to_string()))
}

fn decrypt(key: &[u8], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, SessionStoreError> {
    use chacha20poly1305::aead::{Aead, KeyInit};
    let cipher = chacha20poly1305::ChaCha20Poly1305::new_from_slice(key)
        .map_err(|err| SessionStoreError::Crypto(err.to_string()))?;
    let nonce = chacha20poly1305::Nonce::from_slice(nonce);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|err| SessionStoreError::Crypto(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct KeyringDisabled;

    impl KeyringDisabled {
        fn set() -> Self {
            // SAFETY: only this module's tests touch the variable and they all set it to "1".
            unsafe {
                std::env::set_var(DISABLE_KEYRING_ENV, "1");
            }
            Self
        }
    }

    #[test]
    fn fallback_roundtrip_when_keyring_disabled() {
        let _keyring = KeyringDisabled::set();
        let base = tempdir().unwrap();
        let store = KeyringSessionStore::at(base.path()).unwrap();
        assert_eq!(store.get(), None);

        let session = Session {
            token: "header.payload.sig".to_string(),
            username: Some("anna".to_string()),
            role: Some("admindn".to_string()),
            user_id: Some(12),
        };
        store.set(session.clone()).unwrap();
        assert_eq!(store.get(), Some(session));
        let raw = std::fs::read(store.fallback_token_path()).unwrap();
        assert!(!raw.windows(7).any(|window| window == b"payload"));

        store.clear().unwrap();
        assert_eq!(store.get(), None);
        assert!(!store.profile_path().exists());
    }

    #[test]
    fn corrupt_token_file_reads_as_logged_out() {
        let _keyring = KeyringDisabled::set();
        let base = tempdir().unwrap();
        let store = KeyringSessionStore::at(base.path()).unwrap();
        std::fs::write(store.fallback_token_path(), b"short").unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn empty_token_clears_instead_of_storing() {
        let _keyring = KeyringDisabled::set();
        let base = tempdir().unwrap();
        let store = KeyringSessionStore::at(base.path()).unwrap();
        store.set(Session::new("tok")).unwrap();
        store.set(Session::new("  ")).unwrap();
        assert_eq!(store.get(), None);
    }
}
