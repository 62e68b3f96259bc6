//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::application::services::{
    AssistantService, CourseService, CourseServiceImpl, LiveSessionConfig, LiveSessionService,
    LiveSessionServiceImpl, TicketService, TicketServiceImpl,
};
use crate::config::Settings;
use crate::domain::{CourseRepository, LiveSessionRepository, TicketRepository};
use crate::infrastructure::database;
use crate::infrastructure::repositories::{
    InMemoryCourseRepository, InMemoryLiveSessionRepository, InMemoryTicketRepository,
    PgCourseRepository, PgLiveSessionRepository, PgTicketRepository,
};
use crate::presentation::http::routes;
use crate::presentation::middleware::cors;
use crate::presentation::websocket::Gateway;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub live_sessions: Arc<dyn LiveSessionService>,
    pub courses: Arc<dyn CourseService>,
    pub tickets: Arc<dyn TicketService>,
    pub assistant: Arc<AssistantService>,
    pub gateway: Arc<Gateway>,
    pub settings: Arc<Settings>,
    /// Connection pool when PostgreSQL storage is configured
    pub db: Option<PgPool>,
}

impl AppState {
    fn with_repositories<L, C, T>(
        settings: Settings,
        sessions: L,
        courses: C,
        tickets: T,
        db: Option<PgPool>,
    ) -> Self
    where
        L: LiveSessionRepository + 'static,
        C: CourseRepository + 'static,
        T: TicketRepository + 'static,
    {
        let gateway = Arc::new(Gateway::new(settings.websocket.heartbeat_interval_ms));
        let courses = Arc::new(courses);

        let config = LiveSessionConfig {
            ping_interval_ms: settings.live.ping_interval_ms,
            ping_tolerance_ms: settings.live.ping_tolerance_ms,
            default_provider: settings.live.default_provider,
            default_duration_minutes: settings.live.default_duration_minutes,
        };
        let live_sessions = LiveSessionServiceImpl::new(
            Arc::new(sessions),
            courses.clone(),
            gateway.clone(),
            config,
        );

        Self {
            live_sessions: Arc::new(live_sessions),
            courses: Arc::new(CourseServiceImpl::new(courses)),
            tickets: Arc::new(TicketServiceImpl::new(Arc::new(tickets))),
            assistant: Arc::new(AssistantService::new()),
            gateway,
            settings: Arc::new(settings),
            db,
        }
    }

    /// State backed by in-memory stores
    pub fn in_memory(settings: Settings) -> Self {
        Self::with_repositories(
            settings,
            InMemoryLiveSessionRepository::new(),
            InMemoryCourseRepository::new(),
            InMemoryTicketRepository::new(),
            None,
        )
    }

    /// State backed by PostgreSQL
    pub fn postgres(settings: Settings, db: PgPool) -> Self {
        Self::with_repositories(
            settings,
            PgLiveSessionRepository::new(db.clone()),
            PgCourseRepository::new(db.clone()),
            PgTicketRepository::new(db.clone()),
            Some(db),
        )
    }
}

/// Build the full router with middleware
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);
    routes::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let state = match settings.database.connection_url() {
            Some(url) => {
                let db = database::create_pool(&settings.database, url).await?;
                tracing::info!("Database connection pool created");
                if settings.database.run_migrations {
                    database::run_migrations(&db).await?;
                    tracing::info!("Database migrations applied");
                }
                AppState::postgres(settings.clone(), db)
            }
            None => {
                tracing::warn!("No database URL configured, using in-memory storage");
                AppState::in_memory(settings.clone())
            }
        };

        let router = build_router(state);

        let listener = TcpListener::bind(settings.server_addr()).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
