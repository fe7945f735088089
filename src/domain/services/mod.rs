pub mod availability;
pub mod conflict;
pub mod lifecycle;
