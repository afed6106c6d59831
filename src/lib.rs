pub mod activity;
pub mod cli;
pub mod config;
pub mod filter;
pub mod run;
pub mod server;
pub mod types;
pub mod view;

pub use cli::CliOptions;
pub use server::ActivityServer;
pub use view::ActivityViewModel;
