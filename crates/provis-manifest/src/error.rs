use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid maven coordinate '{0}'")]
    InvalidCoordinate(String),

    #[error("invalid object hash '{0}'")]
    InvalidHash(String),

    #[error(transparent)]
    Path(#[from] provis_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn json(what: &'static str) -> impl FnOnce(serde_json::Error) -> Error {
    move |source| Error::Json { what, source }
}
