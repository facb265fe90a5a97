pub mod list_service;
