use super::{AcceleratedPath, ComputeBackend, NegotiationError, PathSetup};
use crate::effect::Lifecycle;

/// Outcome of [`negotiate`].
pub enum Negotiated {
    Accelerated(Box<dyn AcceleratedPath>),
    Fallback(NegotiationError),
    /// The effect was torn down while negotiating; nothing was kept.
    Cancelled,
}

impl Negotiated {
    pub fn is_accelerated(&self) -> bool {
        matches!(self, Negotiated::Accelerated(_))
    }
}

/// Probes `backend` once: presence, adapter, device, resources.
///
/// The lifecycle is checked before starting and after every await; a dead
/// effect drops whatever the finished stage produced and reports `Cancelled`.
pub async fn negotiate<B: ComputeBackend>(
    backend: &mut B,
    setup: &PathSetup,
    lifecycle: &Lifecycle,
) -> Negotiated {
    if lifecycle.is_dead() {
        return Negotiated::Cancelled;
    }
    if !backend.is_present() {
        log::info!("{} backend not present", backend.name());
        return Negotiated::Fallback(NegotiationError::Unavailable);
    }

    let adapter = match backend.request_adapter().await {
        Ok(adapter) => adapter,
        Err(e) => return Negotiated::Fallback(e),
    };
    if lifecycle.is_dead() {
        return Negotiated::Cancelled;
    }

    let device = match backend.request_device(adapter).await {
        Ok(device) => device,
        Err(e) => return Negotiated::Fallback(e),
    };
    if lifecycle.is_dead() {
        return Negotiated::Cancelled;
    }

    let path = match backend.allocate(device, setup).await {
        Ok(path) => path,
        Err(e) => return Negotiated::Fallback(e),
    };
    if lifecycle.is_dead() {
        return Negotiated::Cancelled;
    }

    log::info!(
        "{} backend ready: {} grid {}x{}",
        backend.name(),
        path.name(),
        setup.grid_size,
        setup.grid_size
    );
    Negotiated::Accelerated(path)
}
