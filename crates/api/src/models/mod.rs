//! Domain models.
//!
//! These types represent validated domain objects separate from the HTTP
//! request/response shapes defined next to each route handler.

pub mod rating;
pub mod session;
pub mod store;
pub mod user;

pub use rating::{Rating, RatingSummary, RatingWithStore, RatingWithUser};
pub use session::{CurrentUser, session_keys};
pub use store::{NewStore, Store, StoreChanges, StoreWithRating};
pub use user::{NewUser, User};
