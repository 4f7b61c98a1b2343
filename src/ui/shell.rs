use dioxus::prelude::*;

use bagspace::domain::AppState;
use bagspace::util::version::{version_label, APP_NAME};

use crate::app::{persist_user_state, Route};

#[component]
pub fn Shell(children: Element) -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let current_route = use_route::<Route>();
    let nav = use_navigator();

    let (theme, user_name) = state.with(|s| {
        (
            s.theme,
            s.session.as_ref().map(|session| session.user_name.clone()),
        )
    });
    let version = version_label();

    rsx! {
        div { class: "{theme.css_class()}",
            header { class: "app-header",
                div {
                    strong { "{APP_NAME}" }
                    span { class: "app-user", " {version}" }
                }
                nav { class: "app-nav",
                    NavButton {
                        active: matches!(current_route, Route::Home {}),
                        onclick: move |_| { nav.push(Route::Home {}); },
                        label: "Publier",
                    }
                    NavButton {
                        active: matches!(current_route, Route::Settings {}),
                        onclick: move |_| { nav.push(Route::Settings {}); },
                        label: "Réglages",
                    }
                }
                div { class: "app-nav",
                    match user_name {
                        Some(name) => rsx! { span { class: "app-user", "{name}" } },
                        None => rsx! { span { class: "app-user", "Non connecté" } },
                    }
                    button {
                        class: "btn",
                        title: "Changer de thème",
                        onclick: move |_| {
                            state.with_mut(|s| s.theme = s.theme.toggled());
                            persist_user_state(&state);
                        },
                        if theme == bagspace::domain::Theme::Dark { "☀" } else { "☾" }
                    }
                }
            }
            {children}
        }
    }
}

#[component]
fn NavButton(active: bool, onclick: EventHandler<()>, label: &'static str) -> Element {
    let class = if active { "btn btn-active" } else { "btn" };
    rsx! {
        button { class: "{class}", onclick: move |_| onclick.call(()), "{label}" }
    }
}
