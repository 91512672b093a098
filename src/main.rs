use std::{future::IntoFuture, process, sync::Arc};

use faqbase::{
    application::{
        access::AccessService,
        analysis::KnowledgeBaseService,
        assistant::{AssistantService, TextProvider, insights},
        error::AppError,
        knowledge_base::KnowledgeBaseRepository,
        questions::QuestionService,
        repos::QuestionStore,
    },
    cache::{CacheConfig, Clock, QueryCache, SystemClock},
    config,
    infra::{
        db::PostgresRepositories, error::InfraError, http, summarizer::InferenceClient, telemetry,
    },
};
use tokio::sync::watch;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Analyze(args) => run_analyze(settings, args).await,
    }
}

struct ApplicationContext {
    clock: Arc<dyn Clock>,
    repository: Arc<KnowledgeBaseRepository>,
    knowledge: Arc<KnowledgeBaseService>,
}

async fn init_store(settings: &config::Settings) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_application_context(
    store: Arc<dyn QuestionStore>,
    settings: &config::Settings,
) -> ApplicationContext {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(QueryCache::new(
        &CacheConfig::from(&settings.cache),
        clock.clone(),
    ));
    let repository = Arc::new(KnowledgeBaseRepository::new(
        store,
        cache,
        settings.database.store_timeout,
    ));
    let knowledge = Arc::new(KnowledgeBaseService::new(repository.clone(), clock.clone()));

    ApplicationContext {
        clock,
        repository,
        knowledge,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = init_store(&settings).await?;
    let app = build_application_context(store, &settings);

    let provider = InferenceClient::from_settings(&settings.assistant)
        .map_err(AppError::from)?
        .map(|client| Arc::new(client) as Arc<dyn TextProvider>);
    if provider.is_none() {
        info!(
            target = "faqbase::serve",
            "No assistant API key configured; using rule-based responses only"
        );
    }

    let state = http::ApiState {
        access: Arc::new(AccessService::new(settings.auth.tokens.clone())),
        questions: Arc::new(QuestionService::new(app.repository.clone())),
        knowledge: app.knowledge.clone(),
        assistant: Arc::new(AssistantService::new(
            app.knowledge.clone(),
            provider,
            app.clock.clone(),
        )),
        clock: app.clock.clone(),
    };

    serve_http(&settings, state).await
}

async fn serve_http(settings: &config::Settings, state: http::ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "faqbase::serve",
        addr = %settings.server.addr,
        "Listening for HTTP requests"
    );

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            let _ = stop_tx.send(true);
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    let deadline = async move {
        if stop_rx.wait_for(|stopping| *stopping).await.is_err() {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
            info!(target = "faqbase::serve", "Server stopped");
        }
        () = deadline => {
            warn!(
                target = "faqbase::serve",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
        }
    }

    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target = "faqbase::serve", error = %err, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target = "faqbase::serve", error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!(target = "faqbase::serve", "Shutdown signal received");
}

async fn run_analyze(
    settings: config::Settings,
    args: config::AnalyzeArgs,
) -> Result<(), AppError> {
    let store = init_store(&settings).await?;
    let app = build_application_context(store, &settings);

    let category = args
        .category
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let analysis = app.knowledge.analyze(category).await;
    if analysis.degraded {
        warn!(
            target = "faqbase::analyze",
            "Some reads fell back to empty results; the analysis is incomplete"
        );
    }

    let report = serde_json::json!({
        "insights": insights(&analysis),
        "statistics": analysis,
        "generated_at": app
            .clock
            .now()
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|err| AppError::unexpected(err.to_string()))?,
    });
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|err| AppError::unexpected(format!("failed to render analysis: {err}")))?;
    println!("{rendered}");

    Ok(())
}
