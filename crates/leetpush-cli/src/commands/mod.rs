pub mod common;
pub mod completions;
pub mod config;
pub mod inspect;
pub mod push;
pub mod test_connection;
pub mod watch;
