pub mod app;
pub mod blob;
pub mod feed;

pub use app::AppState;
pub use feed::{Entry, Feed, MAX_RETAINED};
