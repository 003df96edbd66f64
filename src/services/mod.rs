pub mod live_feed;
pub mod session;
pub mod selection_store;
pub mod venue_loader;
