pub mod obra_commands;
pub mod org_commands;
pub mod rate_limit_commands;
pub mod user_commands;
pub mod utils;
