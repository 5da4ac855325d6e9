//! Tail module — HTTP byte-range reads of instance files, staging long
//! polls, and the multipart recent-logs call.

pub mod fake;
pub mod live;
pub mod reader;
pub mod recent;
pub mod transport;
pub mod window;

pub use live::LiveTransport;
pub use reader::{slice_window, TailReader, DEFAULT_STAGING_POLLS};
pub use recent::RecentLogsClient;
pub use transport::{FetchResponse, FileTransport, ReadTimeout, TimeoutOverride};
pub use window::{AppInstance, TailWindow};
