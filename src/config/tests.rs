use super::*;
use crate::application::access::hash_token;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.database.url, None);
    assert_eq!(
        settings.database.store_timeout,
        Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS)
    );
    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.capacity.get(), DEFAULT_CACHE_CAPACITY);
    assert_eq!(settings.assistant.api_key, None);
    assert_eq!(settings.assistant.summary_model, DEFAULT_SUMMARY_MODEL);
    assert!(settings.auth.tokens.is_empty());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_values_are_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.capacity = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.capacity",
            ..
        })
    ));

    let mut raw = RawSettings::default();
    raw.database.store_timeout_ms = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "database.store_timeout_ms",
            ..
        })
    ));
}

#[test]
fn blank_api_key_disables_provider() {
    let mut raw = RawSettings::default();
    raw.assistant.api_key = Some("   ".to_string());
    raw.assistant.base_url = Some("https://inference.example/models/".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.assistant.api_key, None);
    assert_eq!(settings.assistant.base_url, "https://inference.example/models");
}

#[test]
fn access_tokens_are_validated() {
    let mut raw = RawSettings::default();
    raw.auth.tokens = vec![RawAccessToken {
        digest: hex::encode(hash_token("secret")),
        user_id: "6f1c2a44-0f5e-4d3b-9a57-0d6e1b7c9a10".to_string(),
        role: Role::Manager,
    }];
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.auth.tokens.len(), 1);
    assert_eq!(settings.auth.tokens[0].role, Role::Manager);

    let mut raw = RawSettings::default();
    raw.auth.tokens = vec![RawAccessToken {
        digest: "secret".to_string(),
        user_id: "6f1c2a44-0f5e-4d3b-9a57-0d6e1b7c9a10".to_string(),
        role: Role::Member,
    }];
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "auth.tokens.digest",
            ..
        })
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["faqbase"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_analyze_arguments() {
    let args = CliArgs::parse_from([
        "faqbase",
        "analyze",
        "--database-url",
        "postgres://example",
        "--category",
        "vpn",
    ]);

    match args.command.expect("analyze command") {
        Command::Analyze(analyze) => {
            assert_eq!(
                analyze.database.database_url.as_deref(),
                Some("postgres://example")
            );
            assert_eq!(analyze.category.as_deref(), Some("vpn"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "faqbase",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--cache-enabled",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.cache_enabled, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}
