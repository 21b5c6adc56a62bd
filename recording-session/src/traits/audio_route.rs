use std::sync::Arc;

use crate::models::config::RouteMode;
use crate::models::error::RouteError;

/// Shared platform audio-routing configuration.
pub trait AudioRoute: Send + Sync {
    fn set_mode(&self, mode: RouteMode) -> Result<(), RouteError>;

    fn activate(&self) -> Result<(), RouteError>;
}

impl<T: AudioRoute + ?Sized> AudioRoute for Arc<T> {
    fn set_mode(&self, mode: RouteMode) -> Result<(), RouteError> {
        (**self).set_mode(mode)
    }

    fn activate(&self) -> Result<(), RouteError> {
        (**self).activate()
    }
}
