//! Stored credentials.
//!
//! [`Credentials`] pairs an [`AuthTransport`] with a [`KeyValueStore`]: login stores the
//! returned token and user, logout clears them whether or not the server call succeeds.

use std::sync::Arc;

use crate::client::AuthTransport;
use crate::error::{Error, Result};
use crate::store::{AUTH_TOKEN_KEY, KeyValueStore, USER_KEY};
use crate::types::User;

/// The signed-in user, kept in a [`KeyValueStore`] between runs.
pub struct Credentials {
    transport: Arc<dyn AuthTransport>,
    store: Arc<dyn KeyValueStore>,
}

impl Credentials {
    /// Creates credentials backed by `store`; nothing is read until asked.
    pub fn new(transport: Arc<dyn AuthTransport>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { transport, store }
    }

    /// Signs in and persists the token and user.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let response = self.transport.login(email, password).await?;
        self.store.set(AUTH_TOKEN_KEY, &response.token)?;
        self.store
            .set(USER_KEY, &serde_json::to_string(&response.user)?)?;
        Ok(response.user)
    }

    /// Signs out.
    ///
    /// The server is told about the logout when a token is stored.  A server failure
    /// does not stop the local records from being cleared; it is handed back as
    /// `Ok(Some(error))` for the caller to report.  Only a failure to clear the local
    /// records is an `Err`.
    pub async fn logout(&self) -> Result<Option<Error>> {
        let server_error = match self.token()? {
            Some(token) => self.transport.logout(&token).await.err(),
            None => None,
        };
        self.store.remove(AUTH_TOKEN_KEY)?;
        self.store.remove(USER_KEY)?;
        Ok(server_error)
    }

    /// The stored bearer token, if any.
    pub fn token(&self) -> Result<Option<String>> {
        self.store.get(AUTH_TOKEN_KEY)
    }

    /// The signed-in user, if any.
    pub fn current_user(&self) -> Result<Option<User>> {
        match self.store.get(USER_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Returns true when a token is stored.
    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.token()?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::LoginResponse;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeAuth {
        fail_logout: bool,
        logged_out: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl AuthTransport for FakeAuth {
        async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
            if password != "secreto" {
                return Err(Error::authentication("Credenciales inválidas"));
            }
            Ok(LoginResponse {
                token: "tok-123".to_string(),
                user: User::from_email(email),
            })
        }

        async fn logout(&self, token: &str) -> Result<()> {
            self.logged_out.lock().unwrap().push(token.to_string());
            if self.fail_logout {
                Err(Error::service_unavailable("down"))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn login_persists_credentials() {
        let store = Arc::new(MemoryStore::new());
        let credentials = Credentials::new(Arc::new(FakeAuth::default()), store.clone());
        let user = credentials.login("ana@estudio.pe", "secreto").await.unwrap();
        assert_eq!(user.name, "ana");
        assert_eq!(credentials.token().unwrap().as_deref(), Some("tok-123"));
        assert_eq!(credentials.current_user().unwrap(), Some(user));
        assert!(credentials.is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn failed_login_stores_nothing() {
        let store = Arc::new(MemoryStore::new());
        let credentials = Credentials::new(Arc::new(FakeAuth::default()), store);
        let err = credentials.login("ana@estudio.pe", "x").await.unwrap_err();
        assert!(err.is_authentication());
        assert!(!credentials.is_authenticated().unwrap());
        assert_eq!(credentials.current_user().unwrap(), None);
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_fails() {
        let transport = Arc::new(FakeAuth {
            fail_logout: true,
            ..FakeAuth::default()
        });
        let credentials = Credentials::new(transport.clone(), Arc::new(MemoryStore::new()));
        credentials.login("ana@estudio.pe", "secreto").await.unwrap();
        let server_error = credentials.logout().await.unwrap();
        assert!(server_error.unwrap().is_server_error());
        assert_eq!(*transport.logged_out.lock().unwrap(), vec!["tok-123"]);
        assert_eq!(credentials.token().unwrap(), None);
        assert_eq!(credentials.current_user().unwrap(), None);
    }

    #[tokio::test]
    async fn logout_without_token_skips_server() {
        let transport = Arc::new(FakeAuth::default());
        let credentials = Credentials::new(transport.clone(), Arc::new(MemoryStore::new()));
        assert!(credentials.logout().await.unwrap().is_none());
        assert!(transport.logged_out.lock().unwrap().is_empty());
    }
}
