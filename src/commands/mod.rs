mod error;
mod flights;
mod reference;

pub use error::*;
pub use flights::*;
pub use reference::*;
