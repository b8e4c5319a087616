pub mod action;
pub mod journey;
pub mod session;
pub mod requests;
pub mod responses;

pub use action::*;
pub use journey::*;
pub use session::*;
pub use requests::*;
pub use responses::*;
