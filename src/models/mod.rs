pub mod booking;
pub mod category;

pub use booking::{Booking, BookingStatus, Contact, ItemRequest, LineItem, ReservationRequest};
pub use category::TicketCategory;
