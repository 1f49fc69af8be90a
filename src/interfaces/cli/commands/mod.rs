mod config_gen;
mod leaderboard;
mod users;

pub use config_gen::config_generate;
pub use leaderboard::print_leaderboard;
pub use users::{show_user, upsert_user};
