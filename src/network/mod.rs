pub mod publish;
pub mod relay;
pub mod retrieve;
pub mod upload;

pub use publish::ReplyPublisher;
pub use relay::{Endpoint, PublishStatus, Relay, RelayError, RelayMessage};
pub use retrieve::{ProfileStrategy, SourceRetriever};
pub use upload::{Uploader, VoidCatUploader};
