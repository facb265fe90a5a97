pub mod feed_routes;
pub mod system_routes;
