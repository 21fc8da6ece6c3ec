/* demo/backend/src/datasources/mod.rs */

mod activity;
mod offers;
mod payments;
mod session;
mod user_summary;

pub use activity::activity_feed;
pub use offers::offers;
pub use payments::payments;
pub use session::session;
pub use user_summary::user_summary;
