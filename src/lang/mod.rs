/*!
## Host language helpers

Error taxonomy shared by the whole engine, and radix-aware number
conversion for the outer interpreter.

*/

#[macro_use]
pub mod error;
pub mod radix;

pub use error::Error;
pub use error::ErrorCode;
