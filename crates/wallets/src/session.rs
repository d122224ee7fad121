//! Explicit session state: the connected account, the selected chain and the known
//! user → organization mappings.

use crate::account::{AccountHandle, AuthContext};
use alloy_primitives::Address;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt, io,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to access session file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("session file {} is corrupt: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },
}

/// Everything a session persists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountHandle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_chain: Option<u64>,
    /// user id → organization id
    #[serde(default)]
    pub organizations: BTreeMap<String, String>,
}

/// Loads and saves [`SessionData`].
pub trait SessionStore: Send + Sync + fmt::Debug {
    fn load(&self) -> Result<Option<SessionData>, SessionError>;

    fn save(&self, data: &SessionData) -> Result<(), SessionError>;
}

/// Stores the session as JSON on disk.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<SessionData>, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SessionError::Io { path: self.path.clone(), source }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| SessionError::Json { path: self.path.clone(), source })
    }

    fn save(&self, data: &SessionData) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(data)
            .map_err(|source| SessionError::Json { path: self.path.clone(), source })?;
        std::fs::write(&self.path, json).map_err(io_err)
    }
}

/// Keeps the session in memory only.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore {
    data: Arc<Mutex<Option<SessionData>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns what was last saved.
    pub fn snapshot(&self) -> Option<SessionData> {
        self.data.lock().clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<SessionData>, SessionError> {
        Ok(self.data.lock().clone())
    }

    fn save(&self, data: &SessionData) -> Result<(), SessionError> {
        *self.data.lock() = Some(data.clone());
        Ok(())
    }
}

/// The active session. Every mutation is written through to the store.
#[derive(Clone, Debug)]
pub struct Session {
    data: SessionData,
    store: Arc<dyn SessionStore>,
}

impl Session {
    /// Loads the session from `store`, starting empty if nothing was saved yet.
    pub fn load(store: Arc<dyn SessionStore>) -> Result<Self, SessionError> {
        let data = store.load()?.unwrap_or_default();
        Ok(Self { data, store })
    }

    /// A session that is never persisted.
    pub fn in_memory() -> Self {
        Self { data: SessionData::default(), store: Arc::new(MemorySessionStore::new()) }
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn account(&self) -> Option<&AccountHandle> {
        self.data.account.as_ref()
    }

    pub fn selected_chain(&self) -> Option<u64> {
        self.data.selected_chain
    }

    pub fn organization_for(&self, user_id: &str) -> Option<&str> {
        self.data.organizations.get(user_id).map(String::as_str)
    }

    /// Makes `account` the active account, replacing any previous one.
    pub fn connect(&mut self, account: AccountHandle) -> Result<AccountHandle, SessionError> {
        if let Some(auth) = &account.auth {
            self.data.organizations.insert(auth.user_id.clone(), auth.organization_id.clone());
        }
        debug!(address = %account.address, backend = %account.backend, "session connected");
        self.data.account = Some(account.clone());
        self.save()?;
        Ok(account)
    }

    /// Connects a remote signer account for `user_id`.
    ///
    /// The organization is taken from `organization_id`, then from the stored mapping of the
    /// user. An account without either can not sign until the user logs in again.
    pub fn login_remote(
        &mut self,
        address: Address,
        user_id: &str,
        organization_id: Option<String>,
    ) -> Result<AccountHandle, SessionError> {
        let organization_id =
            organization_id.or_else(|| self.organization_for(user_id).map(str::to_string));
        let auth = organization_id
            .map(|organization_id| AuthContext { user_id: user_id.to_string(), organization_id });
        self.connect(AccountHandle::remote(address, auth))
    }

    /// Clears the active account.
    pub fn disconnect(&mut self) -> Result<Option<AccountHandle>, SessionError> {
        let account = self.data.account.take();
        self.save()?;
        Ok(account)
    }

    /// Clears the active account and forgets its organization mapping.
    pub fn logout(&mut self) -> Result<Option<AccountHandle>, SessionError> {
        let account = self.data.account.take();
        if let Some(auth) = account.as_ref().and_then(|account| account.auth.as_ref()) {
            self.data.organizations.remove(&auth.user_id);
        }
        self.save()?;
        Ok(account)
    }

    pub fn set_selected_chain(&mut self, chain_id: u64) -> Result<(), SessionError> {
        self.data.selected_chain = Some(chain_id);
        self.save()
    }

    fn save(&self) -> Result<(), SessionError> {
        self.store.save(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Backend;

    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb0);

    #[test]
    fn connect_replaces_account() {
        let store = Arc::new(MemorySessionStore::new());
        let mut session = Session::load(store.clone()).unwrap();
        assert!(session.account().is_none());

        session.connect(AccountHandle::external(ALICE)).unwrap();
        session.login_remote(BOB, "user-1", Some("org-1".to_string())).unwrap();

        let account = session.account().unwrap();
        assert_eq!(account.address, BOB);
        assert_eq!(account.backend, Backend::RemoteSigner);
        assert_eq!(store.snapshot().unwrap().account.unwrap().address, BOB);
        assert_eq!(session.organization_for("user-1"), Some("org-1"));
    }

    #[test]
    fn login_reuses_stored_organization() {
        let mut session = Session::in_memory();
        session.login_remote(ALICE, "user-1", Some("org-1".to_string())).unwrap();
        session.disconnect().unwrap();
        assert!(session.account().is_none());

        let account = session.login_remote(ALICE, "user-1", None).unwrap();
        assert_eq!(account.auth.unwrap().organization_id, "org-1");

        session.logout().unwrap();
        assert_eq!(session.organization_for("user-1"), None);
        let account = session.login_remote(ALICE, "user-1", None).unwrap();
        assert!(account.auth.is_none());
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileSessionStore::new(dir.path().join("nested/session.json")));
        {
            let mut session = Session::load(store.clone()).unwrap();
            session.set_selected_chain(10143).unwrap();
            session.login_remote(ALICE, "user-1", Some("org-1".to_string())).unwrap();
        }

        let session = Session::load(store).unwrap();
        assert_eq!(session.selected_chain(), Some(10143));
        assert_eq!(session.account().unwrap().address, ALICE);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{").unwrap();
        let err = Session::load(Arc::new(FileSessionStore::new(path))).unwrap_err();
        assert!(matches!(err, SessionError::Json { .. }), "{err}");
    }
}
