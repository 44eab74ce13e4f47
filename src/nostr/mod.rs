pub mod event;
pub mod keys;
pub mod nip19;
pub mod profile;

pub use event::{Event, Filter, Tag, KIND_METADATA, KIND_TEXT_NOTE};
pub use keys::Keys;
pub use profile::Profile;
