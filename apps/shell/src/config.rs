use std::{collections::HashMap, fs};

use anyhow::Context;
use url::Url;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
    pub content_route: String,
    pub module_base: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8443".into(),
            content_route: "/ui".into(),
            module_base: None,
        }
    }
}

impl Settings {
    /// Module base falls back to `<server_url>/modules/` when not set.
    pub fn resolved_module_base(&self) -> anyhow::Result<Url> {
        match &self.module_base {
            Some(raw) => {
                Url::parse(raw).with_context(|| format!("invalid module base '{raw}'"))
            }
            None => {
                let base = format!("{}/modules/", self.server_url.trim_end_matches('/'));
                Url::parse(&base).with_context(|| format!("invalid module base '{base}'"))
            }
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("shell.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                settings.server_url = v.clone();
            }
            if let Some(v) = file_cfg.get("content_route") {
                settings.content_route = v.clone();
            }
            if let Some(v) = file_cfg.get("module_base") {
                settings.module_base = Some(v.clone());
            }
        }
    }

    if let Ok(v) = std::env::var("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("APP__CONTENT_ROUTE") {
        settings.content_route = v;
    }
    if let Ok(v) = std::env::var("APP__MODULE_BASE") {
        settings.module_base = Some(v);
    }

    settings
}
