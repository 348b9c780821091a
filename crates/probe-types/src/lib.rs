//! Wire types for the distributed-probe measurement API.

mod api_error;
mod measurement;
mod request;

pub use api_error::*;
pub use measurement::*;
pub use request::*;
