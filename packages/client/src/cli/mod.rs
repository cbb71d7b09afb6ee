//! Interactive terminal client.

mod command;
mod identity;
mod mold_api;
mod session;
mod ui;

pub use command::{Command, parse_command};
pub use identity::{resolve_user_id, user_id_from_token};
pub use mold_api::{fetch_molds, molds_url};
pub use session::{ClientConfig, run_client};
