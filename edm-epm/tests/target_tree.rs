use edm_ast::{Document, EntityTypeDecl, FeedMappingDecl, PropertyDecl, SchemaDecl, TypeExpr};
use edm_core::{EpmConfig, Model, TypeId};
use edm_epm::{
    EntityPropertyMappingAttribute, EntityPropertyMappingInfo, EpmErrorKind, EpmTargetTree,
    MappingTarget, ProtocolVersion, build_target_tree,
};

fn custom(source: &str, target: &str) -> EntityPropertyMappingInfo {
    let attribute = EntityPropertyMappingAttribute::new(
        source,
        MappingTarget::Custom {
            target_path: target.to_owned(),
            ns_prefix: Some("x".to_owned()),
            ns_uri: "urn:x".to_owned(),
        },
        true,
    );
    EntityPropertyMappingInfo::new(attribute, TypeId(0), TypeId(0))
}

#[test]
fn duplicate_target_then_remove_and_re_add() {
    let mut tree = EpmTargetTree::new();
    let first = custom("A", "item/@id");
    tree.add(first.clone()).unwrap();

    let err = tree.add(custom("B", "item/@id")).unwrap_err();
    assert_eq!(err.kind, EpmErrorKind::DuplicateTarget);
    assert!(err.message.contains("'A'") && err.message.contains("'B'"), "{}", err.message);

    tree.remove(&first);
    assert!(tree.is_empty());
    tree.add(custom("B", "item/@id")).unwrap();
    assert_eq!(tree.mappings()[0].attribute().source_path, "B");
}

#[test]
fn attribute_must_be_last() {
    let mut tree = EpmTargetTree::new();
    let err = tree.add(custom("A", "item/@id/value")).unwrap_err();
    assert_eq!(err.kind, EpmErrorKind::AttributeInMiddle);
    assert!(tree.is_empty());
}

#[test]
fn content_on_an_element_and_its_descendant_is_mixed() {
    let mut tree = EpmTargetTree::new();
    tree.add(custom("A", "a")).unwrap();
    let err = tree.add(custom("B", "a/b")).unwrap_err();
    assert_eq!(err.kind, EpmErrorKind::MixedContent);
    assert!(err.message.contains("'a'") && err.message.contains("'a/b'"), "{}", err.message);
    // The rejected mapping left nothing behind.
    assert_eq!(tree.mappings().len(), 1);
    assert!(tree.custom_root().children()[0].children().is_empty());

    let mut leaves = EpmTargetTree::new();
    leaves.add(custom("B", "a/b")).unwrap();
    leaves.add(custom("C", "a/c")).unwrap();
    leaves.add(custom("D", "a/@d")).unwrap();
    assert_eq!(leaves.mappings().len(), 3);
}

#[test]
fn attribute_content_under_an_element_with_content_is_allowed() {
    let mut tree = EpmTargetTree::new();
    tree.add(custom("A", "a")).unwrap();
    tree.add(custom("B", "a/@b")).unwrap();
    assert_eq!(tree.mappings().len(), 2);
}

#[test]
fn removal_prunes_single_child_chains() {
    let mut tree = EpmTargetTree::new();
    let kept = custom("K", "a/keep");
    let deep = custom("D", "a/b/c/d");
    tree.add(kept).unwrap();
    tree.add(deep.clone()).unwrap();

    let removed = tree.remove(&deep);
    assert_eq!(removed, deep);
    let a = &tree.custom_root().children()[0];
    assert_eq!(a.name(), Some("a"));
    let names: Vec<_> = a.children().iter().filter_map(|c| c.name()).collect();
    assert_eq!(names, ["keep"]);
}

#[test]
fn syndication_and_custom_mappings_use_separate_subtrees() {
    let doc = Document::new().with_schema(
        SchemaDecl::new("Ns").with_item(
            EntityTypeDecl::new("Post")
                .with_key(&["Id"])
                .with_property(PropertyDecl::new("Id", TypeExpr::named("Edm.Int32").not_null()))
                .with_property(
                    PropertyDecl::new("Title", TypeExpr::named("Edm.String"))
                        .with_feed_mapping(FeedMappingDecl::syndication("SyndicationTitle", true)),
                )
                .with_property(
                    PropertyDecl::new("CustomField", TypeExpr::named("Edm.String"))
                        .with_feed_mapping(FeedMappingDecl::custom("@id", "p", "urn:post", true)),
                ),
        ),
    );
    let model = Model::new(doc);
    let post = model.find_type("Ns.Post").unwrap();
    let tree = build_target_tree(&model, post, &EpmConfig::default()).unwrap();

    let syndication = tree.syndication_root().children();
    assert_eq!(syndication.len(), 1);
    assert_eq!(syndication[0].name(), Some("title"));
    assert!(syndication[0].has_content());

    let custom = tree.custom_root().children();
    assert_eq!(custom.len(), 1);
    assert!(custom[0].is_attribute());
    assert_eq!(custom[0].namespace_uri(), Some("urn:post"));
    assert_eq!(custom[0].info().unwrap().source_path()[0].name, "CustomField");

    assert_eq!(tree.minimum_required_protocol_version(), ProtocolVersion::V1);
}

#[test]
fn excluded_content_raises_the_protocol_version() {
    let mut tree = EpmTargetTree::new();
    let attribute = EntityPropertyMappingAttribute::new(
        "Hidden",
        MappingTarget::Custom {
            target_path: "hidden".to_owned(),
            ns_prefix: None,
            ns_uri: "urn:x".to_owned(),
        },
        false,
    );
    let hidden = EntityPropertyMappingInfo::new(attribute, TypeId(0), TypeId(0));
    tree.add(custom("A", "shown")).unwrap();
    assert_eq!(tree.minimum_required_protocol_version(), ProtocolVersion::V1);
    tree.add(hidden.clone()).unwrap();
    assert_eq!(tree.minimum_required_protocol_version(), ProtocolVersion::V2);
    tree.remove(&hidden);
    assert_eq!(tree.minimum_required_protocol_version(), ProtocolVersion::V1);
}
