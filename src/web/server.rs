//! Web server for sharedrop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::auth::TokenService;
use crate::config::Config;
use crate::file::{BlobStore, OrphanSweeper, ShareIdGenerator};
use crate::quota::QuotaPolicy;
use crate::{Database, Result, SharedropError};

use super::handlers::AppState;
use super::middleware::RateLimitState;
use super::router::create_router;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Login and register rate limiter.
    rate_limit: Arc<RateLimitState>,
    /// CORS allowed origins.
    cors_origins: Vec<String>,
    /// Orphan sweeper and its interval, if enabled.
    sweeper: Option<(OrphanSweeper, Duration)>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: Database, store: Arc<dyn BlobStore>) -> Result<Self> {
        let addr = format!("{}:{}", config.web.host, config.web.port)
            .parse()
            .map_err(|e| SharedropError::Config(format!("invalid web server address: {}", e)))?;

        let tokens = Arc::new(TokenService::new(
            &config.web.jwt_secret,
            config.web.token_expiry_secs,
        ));
        let quota = QuotaPolicy::from_config(db.clone(), &config.quota);
        let share_ids = ShareIdGenerator::from_config(&config.files);

        let sweeper = (config.files.sweep_interval_secs > 0).then(|| {
            (
                OrphanSweeper::new(
                    db.clone(),
                    store.clone(),
                    Duration::from_secs(config.files.orphan_grace_secs),
                ),
                Duration::from_secs(config.files.sweep_interval_secs),
            )
        });

        let app_state = AppState::new(db, store, tokens, quota, share_ids);

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            rate_limit: Arc::new(
                RateLimitState::new(config.web.login_rate_limit)
                    .with_trusted_proxy(config.web.trust_proxy_headers),
            ),
            cors_origins: config.web.cors_origins.clone(),
            sweeper,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the orphan sweep background task.
    fn start_sweep_task(sweeper: OrphanSweeper, every: Duration) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match sweeper.sweep().await {
                    Ok(report) if report.removed > 0 => {
                        tracing::info!(
                            removed = report.removed,
                            bytes = report.bytes_reclaimed,
                            "Removed orphaned blobs"
                        );
                    }
                    Ok(_) => tracing::debug!("No orphaned blobs to remove"),
                    Err(e) => tracing::warn!(error = %e, "Orphan sweep failed"),
                }
            }
        });
    }

    /// Bind the listener and start background tasks.
    async fn prepare(self) -> std::io::Result<(TcpListener, Router)> {
        self.rate_limit.clone().start_cleanup_task();
        let router = create_router(self.app_state, self.rate_limit, &self.cors_origins);

        let listener = TcpListener::bind(self.addr).await?;

        // Start the sweeper only after a successful bind
        if let Some((sweeper, every)) = self.sweeper {
            Self::start_sweep_task(sweeper, every);
            tracing::info!(interval_secs = every.as_secs(), "Orphan sweep task started");
        }

        tracing::info!("Web server listening on http://{}", listener.local_addr()?);
        Ok((listener, router))
    }

    /// Run the web server until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (listener, router) = self.prepare().await?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, router) = self.prepare().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
