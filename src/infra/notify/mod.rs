pub mod http_notification_service;
