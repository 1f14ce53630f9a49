use parking_lot::RwLock;
use showroom_core::{SessionProvider, UserId, Viewer};

pub const DEFAULT_LOGIN_URL: &str = "https://accounts.example.com/login";

/// A session whose viewer is set by the test.
#[derive(Debug)]
pub struct FixedSession {
    viewer: RwLock<Viewer>,
    login_url: String,
}

impl FixedSession {
    pub fn anonymous() -> Self {
        Self {
            viewer: RwLock::new(Viewer::Anonymous),
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }

    pub fn authenticated(user: &str) -> Self {
        Self {
            viewer: RwLock::new(Viewer::Authenticated(UserId::new_unchecked(user))),
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }

    pub fn sign_in(&self, user: &str) {
        *self.viewer.write() = Viewer::Authenticated(UserId::new_unchecked(user));
    }

    pub fn sign_out(&self) {
        *self.viewer.write() = Viewer::Anonymous;
    }
}

impl SessionProvider for FixedSession {
    fn viewer(&self) -> Viewer {
        self.viewer.read().clone()
    }

    fn login_url(&self) -> String {
        self.login_url.clone()
    }
}
