/*!
 * Rolegate - Main Entry Point
 *
 * Standalone permission engine host:
 * - Loads the role document into the configured store
 * - Projects roles into the permission cache
 * - Reloads on SIGHUP, logs statistics periodically
 */

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use rolegate::permissions::{
    JsonFileRoleStore, MemoryBackend, MemoryRoleStore, PermissionCache, RoleStore, TargetResolver,
};
use rolegate::{init_tracing, EngineConfig, PermissionManager, PermissionTree};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured tracing
    init_tracing();

    info!("Rolegate starting...");

    let config = EngineConfig::from_env_or_yaml().context("load engine configuration")?;
    info!(
        namespace = %config.namespace,
        role_file = %config.role_file.display(),
        owners = config.owner_ids.len(),
        "Configuration loaded"
    );

    let tree = Arc::new(PermissionTree::with_defaults().context("register permission tree")?);
    info!(keys = tree.len(), "Permission tree registered");

    let store = open_store(config.store_path.as_deref())?;
    let backend = Arc::new(MemoryBackend::new());
    let cache = Arc::new(
        PermissionCache::new(backend, config.namespace.clone()).context("open permission cache")?,
    );
    let resolver = TargetResolver::new(config.owner_ids.iter().copied());

    let manager = PermissionManager::new(tree, store, cache, resolver)
        .with_role_file(config.role_file.clone());

    if let Err(e) = manager.initialize() {
        // Without a valid document there is nothing to serve
        error!(error = %e, "Failed to initialize permissions");
        return Err(anyhow::Error::new(e).context("initialize permissions"));
    }

    info!(
        roles = manager.snapshot().roles.len(),
        "Rolegate ready - send SIGHUP to reload, Ctrl+C to exit"
    );

    run(&manager).await
}

fn open_store(path: Option<&Path>) -> Result<Arc<dyn RoleStore>> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "Using JSON role store");
            let store = JsonFileRoleStore::open(path)
                .with_context(|| format!("open role store {}", path.display()))?;
            Ok(Arc::new(store))
        }
        None => {
            info!("Using in-memory role store");
            Ok(Arc::new(MemoryRoleStore::new()))
        }
    }
}

#[cfg(unix)]
async fn run(manager: &PermissionManager) -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup()).context("install SIGHUP handler")?;
    let mut stats = tokio::time::interval(Duration::from_secs(60));
    stats.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = hangup.recv() => reload(manager),
            _ = stats.tick() => log_stats(manager),
        }
    }

    info!("Rolegate shutting down");
    Ok(())
}

#[cfg(not(unix))]
async fn run(manager: &PermissionManager) -> Result<()> {
    let mut stats = tokio::time::interval(Duration::from_secs(60));
    stats.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = stats.tick() => log_stats(manager),
        }
    }

    info!("Rolegate shutting down");
    Ok(())
}

#[cfg(unix)]
fn reload(manager: &PermissionManager) {
    info!("SIGHUP received, reloading role file");
    match manager.reload() {
        Ok(()) => info!(roles = manager.snapshot().roles.len(), "Roles reloaded"),
        Err(e) => warn!(error = %e, "Reload rejected, keeping active roles"),
    }
}

fn log_stats(manager: &PermissionManager) {
    let cache = manager.cache_stats();
    let audit = manager.audit_stats();
    info!(
        lookups = cache.lookups,
        explicit_rate = cache.explicit_rate,
        failures = cache.failures,
        granted = audit.total_granted,
        denials = audit.total_denials,
        users_tracked = audit.users_tracked,
        "Permission statistics"
    );
}
