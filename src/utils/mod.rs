pub mod error;
pub mod logging;
pub mod shutdown;

pub use error::*;
pub use shutdown::shutdown_signal;
