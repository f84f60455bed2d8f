pub mod booking;
pub mod driver;
pub mod fare;

pub use booking::{Booking, BookingStatus, PaymentKind, TrafficLevel};
pub use driver::{Driver, DriverStatus, Vehicle};
pub use fare::{FareBreakdown, RouteInfo, SurgeInputs};
