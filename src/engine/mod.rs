mod error;
mod layout;
mod merge;

pub use error::ValidationError;
pub(crate) use error::rejected;
pub use layout::{clusters, layout, layout_tagged, RenderPlan, TaggedPlacement};
pub use merge::merge;
