use std::{
    error::Error,
    fmt::Display,
    ops::{Deref, DerefMut},
    time::Duration,
};

use thiserror::Error;

pub type HttpiResult<T> = Result<T, HttpiError>;
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

#[derive(Debug)]
pub struct HttpiError {
    source: BoxError,
}
impl Deref for HttpiError {
    type Target = BoxError;
    fn deref(&self) -> &Self::Target {
        &self.source
    }
}
impl DerefMut for HttpiError {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.source
    }
}
impl Error for HttpiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}
impl Display for HttpiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}
impl HttpiError {
    pub fn boxed<E: Error + Send + Sync + 'static>(error: E) -> Self {
        HttpiError { source: error.into() }
    }
    pub fn into_source(self) -> BoxError {
        self.source
    }
}

pub trait IntoHttpiError: Sized + Error + Send + Sync + 'static {
    fn into_httpi_error(self) -> HttpiError {
        HttpiError { source: Box::new(self) }
    }
}
impl<E: IntoHttpiError> From<E> for HttpiError {
    fn from(e: E) -> Self {
        e.into_httpi_error()
    }
}

// From<Error> implementation will be conflict (similar issue https://github.com/dtolnay/anyhow/issues/25#issuecomment-544140480)
pub trait IntoResult<T> {
    type Result;
    fn box_err(self) -> Self::Result;
}
impl<T, E: Error + Send + Sync + 'static> IntoResult<T> for Result<T, E> {
    type Result = HttpiResult<T>;
    fn box_err(self) -> Self::Result {
        self.map_err(HttpiError::boxed)
    }
}

#[derive(Error, Debug)]
pub enum SettingError {
    #[error("`{0}` is unknown extension format")]
    UnknownFormatExtension(String),
    #[error("cannot specify format")]
    CannotSpecifyFormat,
    #[error("no serde format is enabled")]
    UndefinedSerializeFormat,
}
impl IntoHttpiError for SettingError {}

#[derive(Error, Debug)]
pub enum RequestConfigError {
    #[error("`{0}` cannot be used as request uri: {1}")]
    InvalidUri(String, http::Error),
    #[error("cannot encode {0}: {1}")]
    FailToEncode(&'static str, BoxError),
}
impl IntoHttpiError for RequestConfigError {}

pub type DispatchResult<T> = Result<T, DispatchError>;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("request aborted")]
    Aborted,
    #[error("request timeout: {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    FailToMakeRequest(BoxError),

    #[error(transparent)]
    NoReady(BoxError),
    #[error(transparent)]
    InnerServiceError(BoxError),
}
impl DispatchError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
