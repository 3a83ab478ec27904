pub mod function;
pub mod id;
pub mod progress;
pub mod result;

pub use function::*;
pub use id::*;
pub use progress::*;
pub use result::*;
