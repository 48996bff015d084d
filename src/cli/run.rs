use std::sync::Arc;
use std::time::Duration;

use crate::backend::http::{DEFAULT_BASE_URL, HttpBackend};
use crate::config::{AppConfig, ConfigPatch, ConfigPersister};
use crate::core::query::GUEST_USER;
use crate::core::session::DEFAULT_IDLE_TIMEOUT;
use crate::core::{AskSession, ClientError, Query, Result, SessionConfig};
use crate::search::{EMPTY_FIELD_TEXT, SearchClient};

use super::repl;
use super::{Cli, Commands, ConfigSubcommands};

pub const SEARCH_FAILED_TEXT: &str = "حدث خطأ في البحث";
pub const PEOPLE_FAILED_TEXT: &str = "حدث خطأ";
pub const NO_RESULTS_TEXT: &str = "لا توجد نتائج.";

/// Effective settings after layering CLI flags over the config file.
struct Settings {
    base_url: String,
    user: String,
    session: SessionConfig,
}

fn resolve_settings(cli: &Cli, config: &AppConfig) -> Settings {
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| config.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let user = cli
        .user
        .clone()
        .or_else(|| config.user.clone())
        .unwrap_or_else(|| GUEST_USER.to_string());

    let streaming = !cli.no_stream && config.stream.unwrap_or(true);
    let idle_timeout = cli
        .idle_timeout
        .or(config.idle_timeout_secs)
        .map_or(DEFAULT_IDLE_TIMEOUT, Duration::from_secs);

    Settings {
        base_url,
        user,
        session: SessionConfig {
            streaming,
            idle_timeout,
        },
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load();
    let settings = resolve_settings(&cli, &config);

    match cli.command {
        Some(Commands::Config { command }) => run_config(&command),
        Some(Commands::Ask { question }) => run_ask(&settings, &question.join(" ")).await,
        Some(Commands::Search { query, prices }) => {
            run_search(&settings, &query.join(" "), prices).await
        }
        Some(Commands::People { name }) => run_people(&settings, &name.join(" ")).await,
        None => {
            let session = build_session(&settings)?;
            repl::run(&session, settings.user).await
        }
    }
}

fn build_session(settings: &Settings) -> Result<AskSession> {
    let backend = HttpBackend::new(settings.base_url.clone())?;
    Ok(AskSession::with_config(
        Arc::new(backend),
        settings.session.clone(),
    ))
}

async fn run_ask(settings: &Settings, question: &str) -> Result<()> {
    let session = build_session(settings)?;

    let Some(handle) = session.submit(Query::new(question, settings.user.clone())) else {
        return Ok(());
    };
    let entry = handle.entry();
    handle.wait().await;

    let transcript = session.transcript();
    let guard = transcript.lock();
    if let Some(text) = guard.text_of(entry) {
        println!("{text}");
    }
    Ok(())
}

async fn run_search(settings: &Settings, query: &str, prices: bool) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(());
    }

    let client = SearchClient::new(settings.base_url.clone())?;
    match client.search(query, prices).await {
        Ok(outcome) => {
            println!("{}", outcome.answer);

            for link in &outcome.links {
                println!("{link}");
            }

            if outcome.sources.is_empty() {
                println!("{EMPTY_FIELD_TEXT}");
            } else {
                for source in &outcome.sources {
                    println!("{} <{}>", source.label(), source.url);
                }
            }

            if let Some(ms) = outcome.latency_ms {
                println!("الوقت: {ms}ms");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "search request failed");
            println!("{SEARCH_FAILED_TEXT}");
        }
    }
    Ok(())
}

async fn run_people(settings: &Settings, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(());
    }

    let client = SearchClient::new(settings.base_url.clone())?;
    match client.people(name).await {
        Ok(sources) if sources.is_empty() => println!("{NO_RESULTS_TEXT}"),
        Ok(sources) => {
            for source in &sources {
                println!("{} <{}>", source.label(), source.url);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "people request failed");
            println!("{PEOPLE_FAILED_TEXT}");
        }
    }
    Ok(())
}

fn run_config(command: &ConfigSubcommands) -> Result<()> {
    match command {
        ConfigSubcommands::Init => match AppConfig::init_default() {
            Ok(path) => println!("✓ Created config file at {}", path.display()),
            Err(e) => eprintln!("✗ Failed to create config: {e}"),
        },
        ConfigSubcommands::Where => match AppConfig::get_config_path() {
            Some(path) => println!("{}", path.display()),
            None => eprintln!("✗ Could not determine config path"),
        },
        ConfigSubcommands::SetUser { name } => {
            let name = name.trim();
            let name = if name.is_empty() { GUEST_USER } else { name };

            let persister = ConfigPersister::with_default_path().ok_or_else(|| {
                ClientError::Config("could not determine config directory".to_string())
            })?;
            persister
                .apply_patch(&ConfigPatch::user(name))
                .map_err(|e| ClientError::Config(e.to_string()))?;

            println!("تم حفظ الاسم: {name}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("args should parse")
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cli = parse(&["bassam", "--base-url", "http://flag:1", "--user", "cli-user"]);
        let config = AppConfig {
            base_url: Some("http://file:2".to_string()),
            user: Some("file-user".to_string()),
            ..Default::default()
        };

        let settings = resolve_settings(&cli, &config);
        assert_eq!(settings.base_url, "http://flag:1");
        assert_eq!(settings.user, "cli-user");
    }

    #[test]
    fn test_config_fills_missing_flags() {
        let cli = parse(&["bassam"]);
        let config = AppConfig {
            base_url: Some("http://file:2".to_string()),
            idle_timeout_secs: Some(5),
            ..Default::default()
        };

        let settings = resolve_settings(&cli, &config);
        assert_eq!(settings.base_url, "http://file:2");
        assert_eq!(settings.user, GUEST_USER);
        assert_eq!(settings.session.idle_timeout, Duration::from_secs(5));
        assert!(settings.session.streaming);
    }

    #[test]
    fn test_no_stream_flag_disables_streaming() {
        let cli = parse(&["bassam", "--no-stream"]);
        let settings = resolve_settings(&cli, &AppConfig::default());
        assert!(!settings.session.streaming);
    }

    #[test]
    fn test_stream_false_in_config_disables_streaming() {
        let cli = parse(&["bassam"]);
        let config = AppConfig {
            stream: Some(false),
            ..Default::default()
        };
        let settings = resolve_settings(&cli, &config);
        assert!(!settings.session.streaming);
    }

    #[test]
    fn test_defaults_without_flags_or_config() {
        let cli = parse(&["bassam"]);
        let settings = resolve_settings(&cli, &AppConfig::default());
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.session.idle_timeout, DEFAULT_IDLE_TIMEOUT);
    }
}
