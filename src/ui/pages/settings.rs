use dioxus::prelude::*;

use bagspace::domain::AppState;
use bagspace::infra::api::ApiClient;
use bagspace::util::{config::AppConfig, version::version_label};

use crate::ui::components::toast::{push_toast, ToastKind, ToastMessage};

#[component]
pub fn SettingsPage() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let toasts = use_context::<Signal<Vec<ToastMessage>>>();
    let client = use_context::<ApiClient>();
    let config = use_context::<AppConfig>();

    let user = state.with(|s| {
        s.session
            .as_ref()
            .map(|session| session.user_name.clone())
            .unwrap_or_else(|| "aucun".to_string())
    });
    let signed_in = state.with(|s| s.is_signed_in());
    let timeout = config.http_timeout.as_secs();
    let ttl = config.lookup_ttl.as_secs();

    let on_clear_cache = move |_| {
        let client = client.clone();
        spawn(async move {
            client.clear_cache().await;
            tracing::info!("lookup cache cleared");
            push_toast(toasts, ToastKind::Info, "Cache des recherches vidé.");
        });
    };

    rsx! {
        main { class: "app-main stacked",
            h1 { "Réglages" }
            dl { class: "settings-list",
                dt { "Version" }
                dd { "{version_label()}" }
                dt { "API" }
                dd { "{config.api_base_url}" }
                dt { "Délai réseau" }
                dd { "{timeout} s" }
                dt { "Durée du cache" }
                dd { "{ttl} s" }
                dt { "Utilisateur" }
                dd { "{user}" }
            }
            div { class: "app-nav",
                button { class: "btn", onclick: on_clear_cache, "Vider le cache" }
                button {
                    class: "btn",
                    disabled: !signed_in,
                    onclick: move |_| {
                        state.with_mut(|s| s.sign_out());
                        push_toast(toasts, ToastKind::Info, "Session fermée.");
                    },
                    "Se déconnecter"
                }
            }
        }
    }
}
