// Fan-out scheduling: retrieval gate, bounded pool, per-task timeouts
pub mod fanout;
pub mod request;
pub mod state;

pub use fanout::{FanOutScheduler, FanOutSettings};
pub use request::ProcessRequest;
pub use state::{RequestEvent, RequestState};
