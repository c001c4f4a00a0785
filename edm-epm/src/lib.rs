#![forbid(unsafe_code)]

//! Entity property mapping: projection of entity properties onto feed
//! syndication items and custom namespaced elements.

mod build;
mod error;
mod mapping;
mod syndication;
mod tree;

pub use build::{build_target_tree, collect_mappings};
pub use error::{EpmError, EpmErrorKind};
pub use mapping::{
    EntityPropertyMappingAttribute, EntityPropertyMappingInfo, MappingTarget, SourcePathSegment,
};
pub use syndication::{SyndicationItemProperty, TextContentKind};
pub use tree::{EpmTargetPathSegment, EpmTargetTree, ProtocolVersion};
