pub mod callback;
pub mod request;
pub mod response;

pub use callback::*;
pub use request::*;
pub use response::*;
