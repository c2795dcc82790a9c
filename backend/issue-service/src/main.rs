use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use tracing_actix_web::TracingLogger;

use issue_service::{
    ai::{CompletionApi, GroqClient},
    config::Config,
    handlers::{auth, issues},
    middleware::JwtAuth,
    services::{
        abuse_guard::AbuseGuard,
        content_validator::ContentValidator,
        email_service::{EmailConfig, EmailService},
        image_analyzer::ImageAnalyzer,
        intake::IssueIntake,
        text_analyzer::TextAnalyzer,
    },
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting Issue Service...");

    let config = Config::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        http_port = config.http_port,
        groq_configured = config.groq_configured(),
        "Configuration loaded"
    );

    let db_config = db_pool::DbConfig::from_env(&config.service_name)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    db_config.log_config();

    let pool = db_pool::create_pool(db_config).await.map_err(|e| {
        tracing::error!("Database pool creation failed: {}", e);
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
    })?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Migration failed: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;
    tracing::info!("Migrations completed");

    // One Groq client shared by both analyzers; absent when unconfigured so
    // the analyzers take their fallback paths
    let groq: Option<Arc<dyn CompletionApi>> = if config.groq_configured() {
        Some(Arc::new(GroqClient::new(
            &config.groq_api_key,
            &config.groq_text_model,
            &config.groq_vision_model,
            Duration::from_secs(config.groq_timeout_secs),
        )))
    } else {
        tracing::warn!("GROQ_API_KEY not set, running with rule-based analysis only");
        None
    };

    let media_store = media_store::MediaStore::from_env().await;

    let email_config = EmailConfig::from_env()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;
    if !email_config.configured() {
        tracing::warn!("SMTP credentials not set, confirmation emails disabled");
    }
    let email_service = Arc::new(EmailService::new(email_config));

    let intake = web::Data::new(IssueIntake {
        validator: ContentValidator::new(),
        abuse_guard: AbuseGuard {
            rate_limit_minutes: config.rate_limit_minutes,
            daily_issue_limit: config.daily_issue_limit,
            duplicate_radius_meters: config.duplicate_radius_meters,
            duplicate_issue_threshold: config.duplicate_issue_threshold,
        },
        text_analyzer: TextAnalyzer::new(groq.clone()),
        image_analyzer: ImageAnalyzer::new(groq),
        media_store,
        email_service,
        severity_text_weight: config.severity_text_weight,
        severity_image_weight: config.severity_image_weight,
    });

    let pool_data = web::Data::new(pool);
    let config_data = web::Data::new(config.clone());
    let bind_addr = (config.host.clone(), config.http_port);

    tracing::info!(host = %config.host, port = config.http_port, "HTTP server starting");

    HttpServer::new(move || {
        let cors = if config_data.cors_allowed_origins == "*" {
            Cors::permissive()
        } else {
            let mut cors = Cors::default()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);
            for origin in config_data.cors_allowed_origins.split(',') {
                cors = cors.allowed_origin(origin.trim());
            }
            cors
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(pool_data.clone())
            .app_data(config_data.clone())
            .app_data(intake.clone())
            .service(
                web::scope("/api/v1")
                    .route("/health", web::get().to(health))
                    .route("/stats/home", web::get().to(issues::home_stats))
                    .service(
                        web::scope("/auth")
                            .route("/register", web::post().to(auth::register))
                            .route("/login", web::post().to(auth::login)),
                    )
                    .service(
                        web::scope("/issues")
                            .wrap(JwtAuth::new(&config_data.jwt_secret))
                            .route("", web::post().to(issues::create_issue))
                            .route("", web::get().to(issues::get_all_issues))
                            .route("/priority", web::get().to(issues::get_priority_issues))
                            .route("/stats", web::get().to(issues::admin_issue_stats))
                            .route("/{issue_id}", web::get().to(issues::get_issue_by_id))
                            .route(
                                "/{issue_id}/status",
                                web::put().to(issues::update_issue_status),
                            )
                            .route("/{issue_id}/fake", web::put().to(issues::report_issue_fake)),
                    ),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}

async fn health(pool: web::Data<sqlx::PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "service": "issue-service",
        })),
        Err(e) => {
            tracing::error!("Health check database ping failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "service": "issue-service",
            }))
        }
    }
}
