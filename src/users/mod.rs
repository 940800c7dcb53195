mod repo;
mod repo_types;

#[cfg(test)]
pub mod memory;

pub use repo::{PgUserStore, StoreError, UserStore};
pub use repo_types::User;
