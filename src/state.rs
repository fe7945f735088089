use std::sync::Arc;

use crate::config::Config;
use crate::domain::ports::{
    AvailabilityRepository, BookingRepository, LedgerRepository, ServiceCatalog,
};
use crate::domain::services::lifecycle::LifecycleService;

/// Shared handles for the HTTP layer. The notification and payment
/// collaborators are owned by [`LifecycleService`], which is the only
/// consumer of those ports.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub availability_repo: Arc<dyn AvailabilityRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub ledger_repo: Arc<dyn LedgerRepository>,
    pub catalog: Arc<dyn ServiceCatalog>,
    pub lifecycle: Arc<LifecycleService>,
}
