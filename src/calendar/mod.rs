mod document;
mod event;
mod extract;
mod normalize;
mod occurrence;

pub mod event_builder;
pub mod relay;

pub use document::*;
pub use event::*;
pub use normalize::*;
pub use occurrence::*;
pub use relay::{Retriever, Strategy, Transport};
