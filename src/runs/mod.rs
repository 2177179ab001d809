pub mod automation;
pub mod executor;
pub mod models;
pub mod session;
pub mod sleep;

#[cfg(test)]
pub(crate) mod testing;

pub use automation::AutomationLoop;
pub use executor::ActionExecutor;
pub use models::*;
pub use session::Session;
pub use sleep::{Sleeper, ThreadSleeper};
