//! Host layer module.

pub mod mock;
pub mod stream;
pub mod traits;

pub use mock::{MockHost, SentCommand};
pub use stream::StreamHost;
pub use traits::{Host, HostError};
