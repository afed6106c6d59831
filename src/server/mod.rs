mod activity_server;
mod file_watcher;
mod format;

pub use activity_server::ActivityServer;
