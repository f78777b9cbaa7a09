use tracing::info;
use tracing_subscriber::EnvFilter;

use pilatesdesk::auth::Directory;
use pilatesdesk::config::Config;
use pilatesdesk::tenant::TenantManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    pilatesdesk::observability::init(config.metrics_port)?;

    let tenant = match &config.login {
        Some((email, password)) => {
            let session = Directory::demo()
                .login(email, password)
                .ok_or("login failed: unknown email or wrong password")?;
            info!("signed in as {} ({:?})", session.email, session.role);
            session.tenant
        }
        None => config.tenant.clone(),
    };

    // Ensure data directory exists
    std::fs::create_dir_all(&config.data_dir)?;

    let tenants = TenantManager::new(config.data_dir.clone(), config.reminder_period);
    let studio = tenants.get_or_create(&tenant)?;

    let today = chrono::Local::now().date_naive();
    let dashboard = studio.engine.dashboard(today).await;
    info!("pilatesdesk tenant {tenant}");
    info!("  data_dir: {}", config.data_dir.display());
    info!("  active students: {}", dashboard.active_students);
    info!("  live bookings: {} ({} today)", dashboard.live_bookings, dashboard.classes_today);
    info!("  rescheduled chains: {}", dashboard.rescheduled_chains);
    info!("  revenue this month: {:.2}", dashboard.revenue_this_month);
    info!("  plans expiring soon: {}", dashboard.expiring_plans);

    if let Some(kind) = config.export {
        print!("{}", studio.engine.export(kind).await);
        return Ok(());
    }

    info!("  reminders: every {}s", config.reminder_period.as_secs());
    info!("  metrics: {}", config.metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    // Run until SIGTERM/ctrl-c; the reminder and dispatcher tasks do the work
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    info!("shutdown signal received, flushing state");
    studio.engine.flush().await?;
    info!("pilatesdesk stopped, {} messages sent this run", studio.outbox.len());
    Ok(())
}
