//! Signed-in user state
//!
//! `Session` owns the current user and the loading flag; the token pair
//! itself stays in the client's token store.

use gradebook_client::models::{Credentials, Role, User};
use gradebook_client::ApiClient;
use tracing::{debug, info, warn};

use crate::error::Result;

/// The user as the screens see it, with the class room flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: String,
    pub login: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub class_id: Option<String>,
    pub class_name: Option<String>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        let (class_id, class_name) = match user.class_room {
            Some(room) => (Some(room.id), Some(room.name)),
            None => (user.class_room_id, None),
        };
        Self {
            id: user.id,
            login: user.login,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            middle_name: user.middle_name,
            class_id,
            class_name,
        }
    }
}

impl SessionUser {
    pub fn full_name(&self) -> String {
        match self.middle_name.as_deref().filter(|m| !m.is_empty()) {
            Some(middle) => format!("{} {} {}", self.last_name, self.first_name, middle),
            None => format!("{} {}", self.last_name, self.first_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<SessionUser>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl Default for SessionState {
    /// Loading until `initialize` has run.
    fn default() -> Self {
        Self {
            user: None,
            is_authenticated: false,
            is_loading: true,
        }
    }
}

pub struct Session {
    client: ApiClient,
    state: SessionState,
}

impl Session {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.state.user.as_ref()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn signed_in(&mut self, user: SessionUser) -> &SessionUser {
        self.state.is_authenticated = true;
        self.state.is_loading = false;
        self.state.user.insert(user)
    }

    fn signed_out(&mut self) {
        self.state = SessionState {
            user: None,
            is_authenticated: false,
            is_loading: false,
        };
    }

    /// Validate and log in. Any failure leaves the session signed out.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<&SessionUser> {
        let result = match credentials.validate() {
            Ok(()) => self.client.login(credentials).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(auth) => {
                let user = SessionUser::from(auth.user);
                info!(login = %user.login, "session started");
                Ok(self.signed_in(user))
            }
            Err(e) => {
                self.signed_out();
                Err(e.into())
            }
        }
    }

    /// Log out locally and, best effort, on the server. Never fails.
    pub async fn logout(&mut self) {
        self.client.logout().await;
        self.signed_out();
    }

    /// Reload the user from `/users/me`. A 401 ends the session; the error
    /// is returned either way.
    pub async fn refresh_user(&mut self) -> Result<&SessionUser> {
        match self.client.me().await {
            Ok(user) => Ok(self.signed_in(SessionUser::from(user))),
            Err(e) => {
                if e.is_unauthorized() {
                    debug!("user reload rejected, signing out");
                    self.state.user = None;
                    self.state.is_authenticated = false;
                }
                Err(e.into())
            }
        }
    }

    /// Restore the session at startup. Errors are logged, not returned:
    /// the session simply ends up signed out.
    pub async fn initialize(&mut self) -> &SessionState {
        self.state.is_loading = true;
        if !self.client.is_authenticated().await {
            self.signed_out();
            return &self.state;
        }
        match self.client.me().await {
            Ok(user) => {
                self.signed_in(SessionUser::from(user));
            }
            Err(e) => {
                warn!(error = %e, "session restore failed");
                self.signed_out();
            }
        }
        &self.state
    }
}
