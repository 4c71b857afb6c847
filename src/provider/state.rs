use serde::Serialize;
use std::fmt;

use crate::error::{CubeSourceError, Result};

/// Lifecycle of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    /// Constructed, `prepare` not yet called (or the last `prepare` failed)
    Uninitialized,
    /// Index built or static file validated
    Prepared,
    /// At least one image computation has completed
    Serving,
    Closed,
}

impl ProviderState {
    /// Whether images may be computed in this state
    pub fn is_ready(&self) -> bool {
        matches!(self, ProviderState::Prepared | ProviderState::Serving)
    }

    /// Fail with `NotPrepared` unless images may be computed
    pub fn ensure_ready(&self, provider: &str) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(CubeSourceError::NotPrepared {
                provider: provider.to_string(),
                state: self.to_string(),
            })
        }
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderState::Uninitialized => "uninitialized",
            ProviderState::Prepared => "prepared",
            ProviderState::Serving => "serving",
            ProviderState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}
