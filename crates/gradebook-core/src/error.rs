//! Error types for state operations

use gradebook_client::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local storage could not be read or written.
    #[error("local storage: {0}")]
    Storage(#[from] gradebook_auth::Error),
}

impl Error {
    /// Short message suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api(e) => e.user_message(),
            Error::Storage(_) => "Could not access local data on this device".to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(e) if e.is_unauthorized())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
