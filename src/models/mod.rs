pub mod selections;
pub mod sidecar;
pub mod tag;

pub use selections::*;
pub use tag::*;
