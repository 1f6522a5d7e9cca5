pub mod accounts;
pub mod attendance;
pub mod backup;
pub mod bookings;
pub mod calendar;
pub mod core;
pub mod decisions;
pub mod slots;
pub mod verify;
