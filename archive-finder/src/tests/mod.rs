use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::FinderConfig;
use crate::locator::AdaptiveLocator;
use crate::probe::Probe;

pub mod fixtures;

/// Locator over an in-memory probe, never cancelled
pub fn locator_for(probe: Arc<dyn Probe>, config: &FinderConfig) -> Arc<AdaptiveLocator> {
    Arc::new(AdaptiveLocator::new(probe, config, CancellationToken::new()).unwrap())
}
