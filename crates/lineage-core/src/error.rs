use sea_orm::DbErr;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No token matched. Transport layers report this as an authentication
    /// failure, not a server error.
    #[error("refresh token not found")]
    RefreshTokenNotFound,

    /// A revoked token was presented again.
    #[error("refresh token already used")]
    RefreshTokenReused,

    #[error("{context}: {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: DbErr,
    },
}

impl Error {
    pub(crate) fn persistence(context: &'static str) -> impl FnOnce(DbErr) -> Self {
        move |source| Error::Persistence { context, source }
    }

    pub(crate) fn missing_row(context: &'static str, what: String) -> Self {
        Error::Persistence {
            context,
            source: DbErr::RecordNotFound(what),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::RefreshTokenNotFound)
    }

    /// True for outcomes the client should answer by signing in again.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::RefreshTokenNotFound | Error::RefreshTokenReused)
    }

    /// True for store failures; the client may retry later.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persistence { .. })
    }
}
