#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod app;
mod ui;

use dioxus::prelude::*;

#[cfg(feature = "desktop")]
use dioxus_desktop::{tao::window::WindowBuilder, Config as DesktopConfig};

use bagspace::infra::api::ApiClient;
use bagspace::util::{config::AppConfig, logging, version::APP_NAME};

fn main() {
    logging::init();

    // Wayland explicit-sync crashes on some drivers; fall back to GL unless the caller opts in.
    if std::env::var("WAYLAND_DISPLAY").is_ok() && std::env::var("WGPU_BACKEND").is_err() {
        std::env::set_var("WGPU_BACKEND", "gl");
    }

    // WebKit's DMABUF renderer opts into explicit sync; disable it unless the user overrides.
    if std::env::var("WAYLAND_DISPLAY").is_ok()
        && std::env::var("WEBKIT_DISABLE_DMABUF_RENDERER").is_err()
    {
        std::env::set_var("WEBKIT_DISABLE_DMABUF_RENDERER", "1");
    }

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "invalid configuration");
            std::process::exit(1);
        }
    };
    let client = match ApiClient::new(&config) {
        Ok(client) => client,
        Err(err) => {
            tracing::error!(%err, "could not build HTTP client");
            std::process::exit(1);
        }
    };
    tracing::info!(?config, "starting {APP_NAME}");

    let builder = LaunchBuilder::new().with_context(config).with_context(client);

    #[cfg(feature = "desktop")]
    let builder = {
        let config = desktop! {
            DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title(APP_NAME)
            )
        };
        builder.with_cfg(config)
    };

    #[cfg(not(feature = "desktop"))]
    let builder = builder;

    builder.launch(app::App);
}
