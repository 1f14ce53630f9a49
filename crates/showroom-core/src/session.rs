use crate::identity::UserId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Who is looking at the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Viewer {
    Anonymous,
    Authenticated(UserId),
}

impl Viewer {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated(id) => Some(id),
        }
    }
}

/// Supplies the current viewer and where to send them to sign in.
pub trait SessionProvider: Send + Sync + 'static {
    fn viewer(&self) -> Viewer;

    /// External login surface used when an action needs an account.
    fn login_url(&self) -> String;
}

impl<T: SessionProvider + ?Sized> SessionProvider for Arc<T> {
    fn viewer(&self) -> Viewer {
        (**self).viewer()
    }

    fn login_url(&self) -> String {
        (**self).login_url()
    }
}
