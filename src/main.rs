use activity_view::activity::ActivityStore;
use activity_view::config::Config;
use activity_view::view::{
    ActivityViewModel, BusyCounter, Collaborators, FeatureGrants, NoticeLog, SystemClock,
    ViewError,
};
use activity_view::{ActivityServer, CliOptions, run};
use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log.rust_log);

    tracing::info!("Starting user activity view");

    let cli = CliOptions::from_args();

    let store = match cli.data_path.as_ref() {
        Some(path) => ActivityStore::open(path).await,
        None => ActivityStore::new(),
    };
    let notices = Arc::new(NoticeLog::new(config.log.notice_size));
    let grants = FeatureGrants::new(
        config
            .view
            .permissions
            .iter()
            .cloned()
            .chain(cli.grants.iter().cloned()),
    );

    let collaborators = Collaborators {
        service: Arc::new(store.clone()),
        notifier: notices.clone(),
        busy: Arc::new(BusyCounter::default()),
        clock: Arc::new(SystemClock),
    };

    let view = match ActivityViewModel::enter(&grants, collaborators, config.fetch_timeout()) {
        Ok(view) => Arc::new(view),
        Err(ViewError::PermissionDenied {
            feature,
            redirect_to,
        }) => {
            tracing::error!("Permission '{feature}' not granted, redirecting to {redirect_to}");
            anyhow::bail!("Access to user activity denied (feature '{feature}')");
        }
        Err(e) => return Err(e.into()),
    };

    let server = ActivityServer::new(view.clone(), store, notices);

    if cli.watch_data {
        server.start_file_watching().await?;
    }

    // Initialize in the background so the transport can come up immediately
    tokio::spawn(async move {
        if let Err(e) = view.initialize().await {
            tracing::error!("Failed to load user activity: {e}");
        }
    });

    run::serve(server, &config.transport).await
}

fn init_tracing(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
