pub mod clock;
pub mod memory;
pub mod serde;
pub mod telemetry;

pub use self::clock::*;
pub use self::memory::*;
pub use self::serde::*;
pub use self::telemetry::*;
