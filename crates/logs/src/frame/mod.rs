//! Frame module — wire schemas, the dual-format parser, and multipart batches.

pub mod proto;
pub mod text;
pub mod parse;
pub mod multipart;

pub use parse::{parse_frame, parse_text_frame};
pub use multipart::parse_multipart;
pub use proto::encode_frame;
pub use text::to_text_frame;
