pub mod assignment;
pub mod booking_flow;
pub mod lifecycle;
pub mod payments;
pub mod pricing;
pub mod routing;
