//! Words the Cortex-M exception mechanism reads and writes on our behalf

mod exc_return;
mod xpsr;

pub use exc_return::{ExcReturn, ReturnTo};
pub use xpsr::Xpsr;
