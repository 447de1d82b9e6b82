//! Global operations

mod find_one;
mod update;

pub use find_one::find_one;
pub use update::update;
