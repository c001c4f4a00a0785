#![forbid(unsafe_code)]

use std::fmt;

use edm_ast::Span;
use edm_core::EpmConfig;
use tracing::{debug, trace};

use crate::error::{EpmError, EpmErrorKind};
use crate::mapping::EntityPropertyMappingInfo;

const ATTRIBUTE_MARKER: char = '@';

/// Feed protocol version needed to serialize a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    V1,
    V2,
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProtocolVersion::V1 => "1.0",
            ProtocolVersion::V2 => "2.0",
        })
    }
}

/// Node of the target tree. Roots have no name; attributes never have
/// children and sort before element siblings.
#[derive(Clone, Debug, Default)]
pub struct EpmTargetPathSegment {
    name: Option<String>,
    ns_uri: Option<String>,
    ns_prefix: Option<String>,
    children: Vec<EpmTargetPathSegment>,
    info: Option<EntityPropertyMappingInfo>,
}

impl EpmTargetPathSegment {
    fn root() -> Self {
        Self::default()
    }

    fn child(name: &str, info: &EntityPropertyMappingInfo) -> Self {
        let attribute = info.attribute();
        Self {
            name: Some(name.to_owned()),
            ns_uri: attribute.namespace_uri().map(str::to_owned),
            ns_prefix: attribute.namespace_prefix().map(str::to_owned),
            children: Vec::new(),
            info: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.ns_uri.as_deref()
    }

    pub fn namespace_prefix(&self) -> Option<&str> {
        self.ns_prefix.as_deref()
    }

    pub fn children(&self) -> &[EpmTargetPathSegment] {
        &self.children
    }

    pub fn info(&self) -> Option<&EntityPropertyMappingInfo> {
        self.info.as_ref()
    }

    pub fn has_content(&self) -> bool {
        self.info.is_some()
    }

    pub fn is_attribute(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|n| n.starts_with(ATTRIBUTE_MARKER))
    }

    fn matches(&self, name: &str, ns_uri: Option<&str>, syndication: bool) -> bool {
        self.name.as_deref() == Some(name) && (syndication || self.ns_uri.as_deref() == ns_uri)
    }

    /// Detaches `info` from the node at `path` below `self` and prunes the
    /// nodes left empty on the way back up.
    fn detach(
        &mut self,
        path: &[&str],
        info: &EntityPropertyMappingInfo,
        syndication: bool,
    ) -> Option<EntityPropertyMappingInfo> {
        let Some((head, rest)) = path.split_first() else {
            return if self.info.as_ref() == Some(info) {
                self.info.take()
            } else {
                None
            };
        };
        let uri = info.attribute().namespace_uri();
        let index = self
            .children
            .iter()
            .position(|c| c.matches(head, uri, syndication))?;
        let removed = self.children[index].detach(rest, info, syndication)?;
        let child = &self.children[index];
        if child.info.is_none() && child.children.is_empty() {
            trace!(segment = head, "pruning empty segment");
            self.children.remove(index);
        }
        Some(removed)
    }

    /// First pair of content-bearing element nodes where one is nested
    /// under the other, as target paths (ancestor, descendant).
    fn find_mixed_content(&self, prefix: &str, ancestor: Option<&str>) -> Option<(String, String)> {
        for child in self.children.iter().filter(|c| !c.is_attribute()) {
            let name = child.name.as_deref().unwrap_or_default();
            let path = if prefix.is_empty() {
                name.to_owned()
            } else {
                format!("{prefix}/{name}")
            };
            let found = match (child.has_content(), ancestor) {
                (true, Some(outer)) => return Some((outer.to_owned(), path)),
                (true, None) => child.find_mixed_content(&path, Some(&path)),
                (false, _) => child.find_mixed_content(&path, ancestor),
            };
            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a EntityPropertyMappingInfo>) {
        if let Some(info) = &self.info {
            out.push(info);
        }
        for child in &self.children {
            child.collect(out);
        }
    }
}

/// Target tree of an entity type's mappings: one subtree for syndication
/// items, one for custom namespaced paths.
#[derive(Clone, Debug)]
pub struct EpmTargetTree {
    syndication_root: EpmTargetPathSegment,
    custom_root: EpmTargetPathSegment,
    excluded_count: usize,
    check_syndication_mixed_content: bool,
}

impl Default for EpmTargetTree {
    fn default() -> Self {
        Self::new()
    }
}

impl EpmTargetTree {
    pub fn new() -> Self {
        Self::with_config(&EpmConfig::default())
    }

    pub fn with_config(config: &EpmConfig) -> Self {
        Self {
            syndication_root: EpmTargetPathSegment::root(),
            custom_root: EpmTargetPathSegment::root(),
            excluded_count: 0,
            check_syndication_mixed_content: config.check_syndication_mixed_content,
        }
    }

    pub fn syndication_root(&self) -> &EpmTargetPathSegment {
        &self.syndication_root
    }

    pub fn custom_root(&self) -> &EpmTargetPathSegment {
        &self.custom_root
    }

    /// Number of mappings whose value is kept out of the entry content.
    pub fn excluded_count(&self) -> usize {
        self.excluded_count
    }

    pub fn minimum_required_protocol_version(&self) -> ProtocolVersion {
        if self.excluded_count > 0 {
            ProtocolVersion::V2
        } else {
            ProtocolVersion::V1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.syndication_root.children.is_empty() && self.custom_root.children.is_empty()
    }

    /// Every mapping in the tree: syndication subtree first, attributes
    /// before elements within each node.
    pub fn mappings(&self) -> Vec<&EntityPropertyMappingInfo> {
        let mut out = Vec::new();
        self.syndication_root.collect(&mut out);
        self.custom_root.collect(&mut out);
        out
    }

    fn split_path(info: &EntityPropertyMappingInfo) -> Result<Vec<&str>, EpmError> {
        let attribute = info.attribute();
        let target = attribute.target_path();
        let segments: Vec<&str> = target.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(EpmError::new(
                EpmErrorKind::EmptySegment,
                attribute.span,
                format!("target path '{target}' has an empty segment"),
            ));
        }
        let last = segments.len() - 1;
        if let Some(bad) = segments[..last]
            .iter()
            .find(|s| s.starts_with(ATTRIBUTE_MARKER))
        {
            return Err(EpmError::new(
                EpmErrorKind::AttributeInMiddle,
                attribute.span,
                format!("attribute '{bad}' must be the last segment of target path '{target}'"),
            ));
        }
        Ok(segments)
    }

    /// Registers a mapping. The tree is left unchanged when an error is
    /// returned.
    pub fn add(&mut self, info: EntityPropertyMappingInfo) -> Result<(), EpmError> {
        let segments = Self::split_path(&info)?;
        let syndication = info.is_syndication_mapping();
        let uri = info.attribute().namespace_uri();
        debug!(
            target_path = info.attribute().target_path(),
            source_path = %info.attribute().source_path,
            syndication,
            "adding mapping"
        );

        let mut node = if syndication {
            &mut self.syndication_root
        } else {
            &mut self.custom_root
        };
        for name in &segments {
            let index = match node
                .children
                .iter()
                .position(|c| c.matches(name, uri, syndication))
            {
                Some(index) => index,
                None if name.starts_with(ATTRIBUTE_MARKER) => {
                    node.children.insert(0, EpmTargetPathSegment::child(name, &info));
                    0
                }
                None => {
                    node.children.push(EpmTargetPathSegment::child(name, &info));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index];
        }

        if let Some(existing) = &node.info {
            return Err(EpmError::new(
                EpmErrorKind::DuplicateTarget,
                info.attribute().span,
                format!(
                    "target '{}' is already mapped from '{}'; cannot also map it from '{}'",
                    info.attribute().target_path(),
                    existing.attribute().source_path,
                    info.attribute().source_path
                ),
            ));
        }
        let excluded = !info.attribute().keep_in_content;
        node.info = Some(info.clone());
        if excluded {
            self.excluded_count += 1;
        }

        if let Err(error) = self.check_mixed_content(syndication, info.attribute().span) {
            self.remove(&info);
            return Err(error);
        }
        Ok(())
    }

    /// Errors carry `span`, the declaration of the mapping being added.
    fn check_mixed_content(&self, syndication: bool, span: Span) -> Result<(), EpmError> {
        let mut roots = vec![&self.custom_root];
        if syndication && self.check_syndication_mixed_content {
            roots.push(&self.syndication_root);
        }
        for root in roots {
            if let Some((outer, inner)) = root.find_mixed_content("", None) {
                return Err(EpmError::new(
                    EpmErrorKind::MixedContent,
                    span,
                    format!("'{outer}' has content and so does its descendant '{inner}'"),
                ));
            }
        }
        Ok(())
    }

    /// Unregisters a mapping previously added and prunes empty segments.
    ///
    /// # Panics
    ///
    /// Panics if the mapping is not in the tree.
    pub fn remove(&mut self, info: &EntityPropertyMappingInfo) -> EntityPropertyMappingInfo {
        let target = info.attribute().target_path();
        let segments: Vec<&str> = target.split('/').collect();
        let syndication = info.is_syndication_mapping();
        let root = if syndication {
            &mut self.syndication_root
        } else {
            &mut self.custom_root
        };
        let removed = root
            .detach(&segments, info, syndication)
            .unwrap_or_else(|| panic!("mapping to '{target}' was never added"));
        if !removed.attribute().keep_in_content {
            self.excluded_count -= 1;
        }
        debug!(target_path = target, "removed mapping");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{EntityPropertyMappingAttribute, MappingTarget};
    use crate::syndication::{SyndicationItemProperty, TextContentKind};
    use edm_core::TypeId;

    fn custom(source: &str, target: &str, keep: bool) -> EntityPropertyMappingInfo {
        let attribute = EntityPropertyMappingAttribute::new(
            source,
            MappingTarget::Custom {
                target_path: target.to_owned(),
                ns_prefix: Some("c".to_owned()),
                ns_uri: "urn:c".to_owned(),
            },
            keep,
        );
        EntityPropertyMappingInfo::new(attribute, TypeId(0), TypeId(0))
    }

    fn syndication(source: &str, item: SyndicationItemProperty) -> EntityPropertyMappingInfo {
        let attribute = EntityPropertyMappingAttribute::new(
            source,
            MappingTarget::Syndication {
                item,
                content_kind: TextContentKind::Plaintext,
            },
            true,
        );
        EntityPropertyMappingInfo::new(attribute, TypeId(0), TypeId(0))
    }

    fn names(seg: &EpmTargetPathSegment) -> Vec<&str> {
        seg.children().iter().filter_map(|c| c.name()).collect()
    }

    #[test]
    fn attributes_sort_before_elements() {
        let mut tree = EpmTargetTree::new();
        tree.add(custom("A", "item/name", true)).unwrap();
        tree.add(custom("B", "item/@id", true)).unwrap();
        let item = &tree.custom_root().children()[0];
        assert_eq!(names(item), ["@id", "name"]);
        assert!(item.children()[0].is_attribute());
        assert_eq!(item.children()[0].namespace_uri(), Some("urn:c"));
    }

    #[test]
    fn same_name_in_other_namespace_is_a_separate_node() {
        let mut tree = EpmTargetTree::new();
        tree.add(custom("A", "item", true)).unwrap();
        let attribute = EntityPropertyMappingAttribute::new(
            "B",
            MappingTarget::Custom {
                target_path: "item".to_owned(),
                ns_prefix: None,
                ns_uri: "urn:other".to_owned(),
            },
            true,
        );
        tree.add(EntityPropertyMappingInfo::new(attribute, TypeId(0), TypeId(0)))
            .unwrap();
        assert_eq!(names(tree.custom_root()), ["item", "item"]);
        assert_eq!(tree.custom_root().children()[1].namespace_prefix(), None);
    }

    #[test]
    fn syndication_paths_share_prefixes() {
        let mut tree = EpmTargetTree::new();
        tree.add(syndication("Name", SyndicationItemProperty::AuthorName)).unwrap();
        tree.add(syndication("Mail", SyndicationItemProperty::AuthorEmail)).unwrap();
        assert_eq!(names(tree.syndication_root()), ["author"]);
        assert_eq!(names(&tree.syndication_root().children()[0]), ["name", "email"]);
        assert_eq!(tree.mappings().len(), 2);
    }

    #[test]
    fn empty_segment_is_rejected() {
        let mut tree = EpmTargetTree::new();
        let err = tree.add(custom("A", "a//b", true)).unwrap_err();
        assert_eq!(err.kind, EpmErrorKind::EmptySegment);
        assert!(tree.is_empty());
    }

    #[test]
    fn exclusion_count_follows_add_and_remove() {
        let mut tree = EpmTargetTree::new();
        let hidden = custom("A", "a", false);
        tree.add(hidden.clone()).unwrap();
        assert_eq!(tree.excluded_count(), 1);
        assert_eq!(tree.minimum_required_protocol_version(), ProtocolVersion::V2);
        tree.remove(&hidden);
        assert_eq!(tree.excluded_count(), 0);
        assert_eq!(tree.minimum_required_protocol_version().to_string(), "1.0");
    }

    #[test]
    #[should_panic(expected = "never added")]
    fn removing_an_unknown_mapping_panics() {
        let mut tree = EpmTargetTree::new();
        tree.remove(&custom("A", "a", true));
    }

    #[test]
    fn syndication_mixed_content_is_opt_in() {
        let mut tree = EpmTargetTree::with_config(&EpmConfig {
            check_syndication_mixed_content: true,
        });
        tree.add(syndication("Name", SyndicationItemProperty::AuthorName)).unwrap();
        tree.add(syndication("Title", SyndicationItemProperty::Title)).unwrap();
        assert_eq!(tree.mappings().len(), 2);
        assert_eq!(tree.minimum_required_protocol_version(), ProtocolVersion::V1);
    }

    #[test]
    fn mixed_content_error_points_at_the_rejected_mapping() {
        let mut tree = EpmTargetTree::new();
        tree.add(custom("A", "a", true)).unwrap();
        let mut attribute = EntityPropertyMappingAttribute::new(
            "B",
            MappingTarget::Custom {
                target_path: "a/b".to_owned(),
                ns_prefix: Some("c".to_owned()),
                ns_uri: "urn:c".to_owned(),
            },
            true,
        );
        let declared_at = edm_ast::span(40, 12);
        attribute.span = declared_at;
        let nested = EntityPropertyMappingInfo::new(attribute, TypeId(0), TypeId(0));
        let err = tree.add(nested).unwrap_err();
        assert_eq!(err.kind, EpmErrorKind::MixedContent);
        assert_eq!(err.span, declared_at);
    }
}
