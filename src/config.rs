use std::env;

use anyhow::Result;
use once_cell::sync::Lazy;

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub log_level: String,
    pub olx_base_url: String,
    pub browser_headless: bool,
    pub chromium_path: Option<String>,
    pub page_nav_timeout_seconds: u64,
    pub results_wait_timeout_seconds: u64,
    pub field_prompt_timeout_seconds: u64,
    pub notice_ttl_seconds: u64,
    pub health_port: u16,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn load() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(anyhow::anyhow!("BOT_TOKEN is required"));
        }

        let chromium_path = env::var("CHROMIUM_PATH")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        Ok(Config {
            bot_token,
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            olx_base_url: env_string("OLX_BASE_URL", "https://www.olx.ua/uk"),
            browser_headless: env_bool("BROWSER_HEADLESS", true),
            chromium_path,
            page_nav_timeout_seconds: env_u64("PAGE_NAV_TIMEOUT_SECONDS", 30),
            results_wait_timeout_seconds: env_u64("RESULTS_WAIT_TIMEOUT_SECONDS", 10),
            field_prompt_timeout_seconds: env_u64("FIELD_PROMPT_TIMEOUT_SECONDS", 60),
            notice_ttl_seconds: env_u64("NOTICE_TTL_SECONDS", 5),
            health_port: env_u16("PORT", 3000),
        })
    }
}
