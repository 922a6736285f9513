use std::env;
use std::fs;
use std::path::Path;

use hookline_core::config::{resolve_config_path, AppConfig};
use toml::Value;

use crate::commands::{load_options, CommandResult};

pub fn run(config_file: Option<&Path>) -> CommandResult {
    let config = match AppConfig::load(load_options(config_file)) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("config", "config_validation", error.to_string(), 2)
        }
    };

    let config_file_path = resolve_config_path(config_file);
    let sources = Sources {
        doc: load_config_file_doc(config_file_path.as_deref()),
        path: config_file_path.as_deref(),
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "discord.public_key",
        config.discord.public_key.as_deref().unwrap_or("<unset>"),
        sources.field("discord.public_key", &["HOOKLINE_DISCORD_PUBLIC_KEY", "DISCORD_PUBLIC_KEY"]),
    ));
    lines.push(render_line(
        "discord.application_id",
        config.discord.application_id.as_deref().unwrap_or("<unset>"),
        sources.field("discord.application_id", &["HOOKLINE_DISCORD_APPLICATION_ID"]),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        sources.field("server.bind_address", &["HOOKLINE_SERVER_BIND_ADDRESS"]),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        sources.field("server.port", &["HOOKLINE_SERVER_PORT"]),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        sources.field(
            "server.graceful_shutdown_secs",
            &["HOOKLINE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        sources.field("logging.level", &["HOOKLINE_LOGGING_LEVEL", "HOOKLINE_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        sources.field("logging.format", &["HOOKLINE_LOGGING_FORMAT", "HOOKLINE_LOG_FORMAT"]),
    ));

    for (locale, entries) in &config.messages.locales {
        let key_path = format!("messages.{locale}");
        lines.push(render_line(
            &key_path,
            &format!("{} override(s)", entries.len()),
            sources.field(&key_path, &[]),
        ));
    }

    CommandResult::success(lines.join("\n"))
}

struct Sources<'a> {
    doc: Option<Value>,
    path: Option<&'a Path>,
}

impl Sources<'_> {
    fn field(&self, key_path: &str, env_keys: &[&str]) -> String {
        if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
            return format!("env ({env_key})");
        }

        if let Some(doc) = &self.doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

/// Locale tags contain dots only inside quoted TOML keys, so `messages.<locale>` is split once.
fn contains_path(root: &Value, key_path: &str) -> bool {
    if let Some(locale) = key_path.strip_prefix("messages.") {
        return root.get("messages").and_then(|messages| messages.get(locale)).is_some();
    }

    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
