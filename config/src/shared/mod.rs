mod base;
mod batch;
mod checkpoint;
mod connection;
mod rebuild;
mod workflow;

pub use base::*;
pub use batch::*;
pub use checkpoint::*;
pub use connection::*;
pub use rebuild::*;
pub use workflow::*;
