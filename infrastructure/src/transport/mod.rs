//! Job transport adapters.

mod channel;

pub use channel::{ChannelJobTransport, JobReceiver, DEFAULT_QUEUE_CAPACITY};
