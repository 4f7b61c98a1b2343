use serde::{Deserialize, Serialize};

/// Colour scheme picked by the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Theme::Light => "theme-light",
            Theme::Dark => "theme-dark",
        }
    }
}

/// Signed-in user as far as the client knows. The token is sent as a bearer header.
#[derive(Clone, PartialEq)]
pub struct Session {
    pub user_name: String,
    pub token: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_name", &self.user_name)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Application-wide state, created at bootstrap and handed down through context.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub theme: Theme,
    pub session: Option<Session>,
}

impl AppState {
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }

    pub fn sign_in(&mut self, session: Session) {
        tracing::info!(user = %session.user_name, "session started");
        self.session = Some(session);
    }

    /// Drops the session; the caller is expected to close any open wizard.
    pub fn sign_out(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(user = %session.user_name, "session ended");
        }
    }

    pub fn apply_persisted(&mut self, persisted: PersistedState) {
        self.theme = persisted.theme;
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState { theme: self.theme }
    }
}

/// Subset of [`AppState`] written to disk. Sessions and drafts never are.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub theme: Theme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_out_clears_token() {
        let mut state = AppState::default();
        state.sign_in(Session {
            user_name: "amina".into(),
            token: "secret".into(),
        });
        assert_eq!(state.bearer_token(), Some("secret"));
        state.sign_out();
        assert!(!state.is_signed_in());
    }

    #[test]
    fn only_theme_is_persisted() {
        let mut state = AppState::default();
        state.theme = Theme::Dark;
        state.sign_in(Session {
            user_name: "amina".into(),
            token: "secret".into(),
        });
        let json = serde_json::to_string(&state.to_persisted()).unwrap();
        assert!(!json.contains("secret"));

        let mut restored = AppState::default();
        restored.apply_persisted(serde_json::from_str(&json).unwrap());
        assert_eq!(restored.theme, Theme::Dark);
        assert!(!restored.is_signed_in());
    }

    #[test]
    fn debug_output_hides_token() {
        let session = Session {
            user_name: "amina".into(),
            token: "secret".into(),
        };
        assert!(!format!("{session:?}").contains("secret"));
    }
}
