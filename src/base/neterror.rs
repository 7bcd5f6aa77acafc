use std::{io, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Host resolution errors
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name not resolved: {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Name resolution failed")]
    NameResolutionFailed,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    /// Build a `NameNotResolvedFor` from the resolver backend's IO error.
    pub fn dns_failed(domain: impl Into<String>, source: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.into(),
            source: Arc::new(source),
        }
    }

    /// Hostname the error refers to, if it carries one.
    pub fn domain(&self) -> Option<&str> {
        match self {
            NetError::NameNotResolvedFor { domain, .. } => Some(domain),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::NameNotResolved => -105,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::NameResolutionFailed => -137,
            NetError::Unknown(code) => *code,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -105 => NetError::NameNotResolved,
            -137 => NetError::NameResolutionFailed,
            _ => NetError::Unknown(code),
        }
    }
}
