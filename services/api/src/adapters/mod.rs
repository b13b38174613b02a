pub mod db;
pub mod memory;

pub use db::PgCardStore;
pub use memory::MemoryCardStore;
