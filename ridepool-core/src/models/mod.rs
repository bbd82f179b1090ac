pub mod booking;
pub mod profile;
pub mod ride;
pub mod ride_request;

pub use booking::{Booking, BookingStatus, BookingWithRide, PaymentStatus};
pub use profile::{Profile, ProfileUpdate};
pub use ride::{NewRide, Ride, RideFilter, RideStatus};
pub use ride_request::{NewRideRequest, RideRequest};
