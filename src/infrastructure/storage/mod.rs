//! Storage infrastructure - Database connectivity and migrations

pub mod migrations;
mod postgres;

pub use migrations::{
    revert_last_storage_migration, run_storage_migrations, Migration, PostgresMigrator,
};
pub use postgres::{connect_pool, PostgresConfig};
