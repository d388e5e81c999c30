use crate::config::Settings;
use crate::policy::{load_rules, RuleSet};
use crate::proxy::FirewallService;
use crate::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, instrument};

/// Main application struct that coordinates all components
pub struct Application {
    settings: Settings,
    listen_addr: SocketAddr,
    rules: Arc<RuleSet>,
    service: FirewallService,
}

impl Application {
    /// Load the rule set and validate every setting; nothing is served yet
    #[instrument(skip_all)]
    pub fn new(settings: Settings) -> Result<Self> {
        let listen_addr = settings.listen_addr()?;
        let proxy_config = settings.proxy_config()?;
        let rules = Arc::new(load_rules(&settings.rules.path)?);

        info!(
            upstream = %proxy_config.target_url,
            rules = rules.len(),
            "Firewall configured"
        );

        let service = FirewallService::new(proxy_config, Arc::clone(&rules));

        Ok(Self {
            settings,
            listen_addr,
            rules,
            service,
        })
    }

    /// Bind the listener and serve until Ctrl-C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.listen_addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    #[instrument(skip_all, fields(addr = %self.listen_addr))]
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        info!(addr = %listener.local_addr()?, "Firewall listening");

        axum::serve(listener, self.service.into_router())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Firewall stopped");
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (ctrl-c)"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
