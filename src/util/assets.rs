use std::{borrow::Cow, sync::OnceLock};

use rust_embed::RustEmbed;

/// Embed the entire `assets/` directory into the binary.
#[derive(RustEmbed)]
#[folder = "assets"]
struct EmbeddedAssets;

static MAIN_CSS: OnceLock<String> = OnceLock::new();

/// Returns the contents of `assets/main.css`, or an empty sheet if it is missing.
pub fn main_css() -> &'static str {
    MAIN_CSS
        .get_or_init(|| load_text("/assets/main.css").unwrap_or_default())
        .as_str()
}

fn load_text(path: &str) -> Option<String> {
    let asset = load_asset(path)?;
    match String::from_utf8(asset.into_owned()) {
        Ok(text) => Some(text),
        Err(_) => {
            tracing::warn!(path, "embedded asset is not valid UTF-8");
            None
        }
    }
}

fn load_asset(path: &str) -> Option<Cow<'static, [u8]>> {
    let canonical = canonical_asset_path(path);
    let asset = EmbeddedAssets::get(&canonical).map(|file| file.data);
    if asset.is_none() {
        tracing::warn!(path, "embedded asset not found");
    }
    asset
}

fn canonical_asset_path(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if let Some(rest) = trimmed.strip_prefix("assets/") {
        rest.to_string()
    } else {
        trimmed.to_string()
    }
}
