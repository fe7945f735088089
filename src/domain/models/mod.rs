pub mod availability;
pub mod booking;
pub mod credits;
pub mod ledger;
pub mod service;
