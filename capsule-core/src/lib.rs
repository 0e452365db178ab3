pub mod clock;
pub mod hold;
pub mod repository;
pub mod reservation;
pub mod room;
pub mod stay;

pub use clock::{Clock, ManualClock, SystemClock};
pub use hold::{Hold, HoldStage};
pub use repository::{HoldRepository, ReservationStore, RoomInventory, StoreError};
pub use reservation::{NewReservation, Reservation, ReservationStatus};
pub use room::{QualityTier, Room, RoomStatus, Zone};
pub use stay::{StayRange, StayRangeError};
