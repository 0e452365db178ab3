pub mod app_config;
pub mod database;
pub mod hold_repo;
pub mod memory;
pub mod reservation_repo;
pub mod room_repo;

pub use app_config::{BusinessRules, Config, DatabaseConfig};
pub use database::DbClient;
pub use hold_repo::PgHoldRepository;
pub use memory::{MemoryHoldRepository, MemoryReservationStore, MemoryRoomInventory};
pub use reservation_repo::PgReservationStore;
pub use room_repo::PgRoomInventory;
