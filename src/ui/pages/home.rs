use dioxus::prelude::*;

use bagspace::domain::{AppState, ListingKind};

use crate::ui::wizard_dialog::ListingWizardDialog;

#[component]
pub fn HomePage() -> Element {
    let state = use_context::<Signal<AppState>>();
    let mut travel_open = use_signal(|| false);
    let mut package_open = use_signal(|| false);
    let signed_in = state.with(|s| s.is_signed_in());

    rsx! {
        main { class: "app-main stacked",
            h1 { "Que souhaitez-vous publier ?" }
            if !signed_in {
                p { class: "wizard-hint",
                    "Aucune session active. La publication sera refusée tant que BAGSPACE_API_TOKEN n'est pas défini."
                }
            }
            div { class: "app-nav",
                button {
                    class: "btn btn-primary",
                    onclick: move |_| {
                        package_open.set(false);
                        travel_open.set(true);
                    },
                    "{ListingKind::Travel.title()}"
                }
                button {
                    class: "btn",
                    onclick: move |_| {
                        travel_open.set(false);
                        package_open.set(true);
                    },
                    "{ListingKind::Package.title()}"
                }
            }
            ListingWizardDialog { kind: ListingKind::Travel, open: travel_open }
            ListingWizardDialog { kind: ListingKind::Package, open: package_open }
        }
    }
}
