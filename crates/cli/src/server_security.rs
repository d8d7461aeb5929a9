use anyhow::{Context as AnyhowContext, Result};
use std::net::SocketAddr;

/// Resolves `bind` and refuses non-loopback addresses unless `public` is set.
pub(crate) async fn resolve_guarded_bind_addrs(
    bind: &str,
    public: bool,
) -> Result<Vec<SocketAddr>> {
    // Tokio's resolver accepts host names such as "localhost:8080".
    let addrs: Vec<SocketAddr> = tokio::net::lookup_host(bind)
        .await
        .with_context(|| format!("Failed to resolve bind address: {bind}"))?
        .collect();
    if addrs.is_empty() {
        anyhow::bail!("Bind address {bind} did not resolve to any socket address");
    }
    if !public {
        if let Some(exposed) = first_exposed(&addrs) {
            anyhow::bail!(
                "Refusing to bind {bind} ({exposed} is not loopback) without --public. \
                 The viewer has no authentication; pass --public only on trusted networks."
            );
        }
    }
    Ok(addrs)
}

fn first_exposed(addrs: &[SocketAddr]) -> Option<SocketAddr> {
    addrs.iter().copied().find(|addr| !addr.ip().is_loopback())
}
