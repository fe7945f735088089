use serde::{Deserialize, Serialize};

use crate::domain::models::credits::Credits;

/// A bookable service as the external catalog describes it. Duration and
/// price are copied onto the booking at creation time and are immutable
/// inputs from then on.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServiceOffering {
    pub id: String,
    pub name: String,
    pub duration_minutes: i32,
    pub credits_required: Credits,
}
