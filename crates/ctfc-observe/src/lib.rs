mod logger;
pub use logger::*;

mod forward;
pub use forward::ForwardLayer;
