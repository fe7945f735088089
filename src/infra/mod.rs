pub mod catalog;
pub mod factory;
pub mod notify;
pub mod payment;
pub mod repositories;
