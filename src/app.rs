use dioxus::{prelude::*, signals::Signal};

use bagspace::{
    domain::{AppState, Session},
    util::{
        assets,
        config::AppConfig,
        persistence::{load_persisted_state, save_persisted_state},
    },
};

use crate::ui::{
    components::toast::{Toast, ToastMessage},
    pages::{HomePage, SettingsPage},
    shell::Shell,
};

#[derive(Routable, Clone, PartialEq)]
pub enum Route {
    #[route("/")]
    Home {},
    #[route("/settings")]
    Settings {},
}

#[component]
pub fn App() -> Element {
    let config = use_context::<AppConfig>();

    let state = use_signal(AppState::default);
    use_hook({
        let mut state = state;
        move || {
            state.with_mut(|st| {
                if let Some(saved) = load_persisted_state() {
                    st.apply_persisted(saved);
                }
                if let Some(token) = config.api_token.clone() {
                    st.sign_in(Session {
                        user_name: config
                            .user_name
                            .clone()
                            .unwrap_or_else(|| "invité".to_string()),
                        token,
                    });
                }
            });
        }
    });
    use_context_provider(|| state);

    let toasts = use_signal(Vec::<ToastMessage>::new);
    use_context_provider(|| toasts);

    rsx! {
        document::Style { "{assets::main_css()}" }
        Router::<Route> {}
        Toast {}
    }
}

pub fn persist_user_state(state: &Signal<AppState>) {
    let snapshot = state.with(|st| st.to_persisted());
    if let Err(err) = save_persisted_state(&snapshot) {
        tracing::warn!(%err, "failed to persist preferences");
    }
}

#[component]
pub fn Home() -> Element {
    rsx! { Shell { HomePage {} } }
}

#[component]
pub fn Settings() -> Element {
    rsx! { Shell { SettingsPage {} } }
}
