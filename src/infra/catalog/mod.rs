pub mod http_service_catalog;
