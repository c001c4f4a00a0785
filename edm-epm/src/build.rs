#![forbid(unsafe_code)]

use edm_core::{ElementRef, EpmConfig, Model, TypeId};
use tracing::debug;

use crate::error::EpmError;
use crate::mapping::{EntityPropertyMappingAttribute, EntityPropertyMappingInfo};
use crate::tree::EpmTargetTree;

/// Mappings declared on `entity` and its ancestors, base type first. Each
/// is resolved against `entity`, whichever type declared it.
pub fn collect_mappings(
    model: &Model,
    entity: TypeId,
) -> Result<Vec<EntityPropertyMappingInfo>, EpmError> {
    let chain: Vec<TypeId> = model.self_and_ancestors(entity).collect();
    let mut out = Vec::new();
    for defining in chain.into_iter().rev() {
        let declared = model.structured_type(defining);
        for decl in &declared.feed_mappings {
            let attribute = EntityPropertyMappingAttribute::from_decl(decl, None)?;
            out.push(resolved(model, attribute, defining, entity)?);
        }
        for property in &declared.declared_properties {
            let property = model.property(*property);
            let Some(decl) = property.as_structural().and_then(|s| s.feed_mapping.as_ref()) else {
                continue;
            };
            let attribute = EntityPropertyMappingAttribute::from_decl(
                decl,
                Some(property.common.name.as_str()),
            )?;
            out.push(resolved(model, attribute, defining, entity)?);
        }
    }
    Ok(out)
}

fn resolved(
    model: &Model,
    attribute: EntityPropertyMappingAttribute,
    defining: TypeId,
    entity: TypeId,
) -> Result<EntityPropertyMappingInfo, EpmError> {
    let mut info = EntityPropertyMappingInfo::new(attribute, defining, entity);
    info.resolve_source_path(model)?;
    Ok(info)
}

/// Builds the target tree of an entity type from its own and inherited
/// mapping declarations.
///
/// # Panics
///
/// Panics if `entity` is not an entity type.
pub fn build_target_tree(
    model: &Model,
    entity: TypeId,
    config: &EpmConfig,
) -> Result<EpmTargetTree, EpmError> {
    assert!(
        model.schema_type(entity).is_entity(),
        "'{}' is not an entity type",
        model.full_name(ElementRef::Type(entity))
    );
    let mut tree = EpmTargetTree::with_config(config);
    for info in collect_mappings(model, entity)? {
        tree.add(info)?;
    }
    debug!(
        entity = %model.full_name(ElementRef::Type(entity)),
        mappings = tree.mappings().len(),
        "built target tree"
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EpmErrorKind;
    use edm_ast::{Document, EntityTypeDecl, FeedMappingDecl, PropertyDecl, SchemaDecl, TypeExpr};

    fn string(name: &str) -> PropertyDecl {
        PropertyDecl::new(name, TypeExpr::named("Edm.String"))
    }

    fn id() -> PropertyDecl {
        PropertyDecl::new("Id", TypeExpr::named("Edm.Int32").not_null())
    }

    #[test]
    fn inherited_mappings_come_first_and_read_the_derived_type() {
        let doc = Document::new().with_schema(
            SchemaDecl::new("Ns")
                .with_item(
                    EntityTypeDecl::new("Base")
                        .with_key(&["Id"])
                        .with_property(id())
                        .with_property(string("Title").with_feed_mapping(
                            FeedMappingDecl::syndication("SyndicationTitle", true),
                        )),
                )
                .with_item(
                    EntityTypeDecl::new("Derived")
                        .with_base("Base")
                        .with_property(string("Code"))
                        .with_feed_mapping(
                            FeedMappingDecl::custom("code/@value", "d", "urn:d", false)
                                .with_source("Code"),
                        ),
                ),
        );
        let model = Model::new(doc);
        let base = model.find_type("Ns.Base").unwrap();
        let derived = model.find_type("Ns.Derived").unwrap();

        let infos = collect_mappings(&model, derived).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].defining_type(), base);
        assert_eq!(infos[0].actual_type(), derived);
        assert_eq!(infos[1].defining_type(), derived);

        let tree = build_target_tree(&model, derived, &EpmConfig::default()).unwrap();
        assert_eq!(tree.mappings().len(), 2);
        assert_eq!(tree.minimum_required_protocol_version().to_string(), "2.0");

        let base_tree = build_target_tree(&model, base, &EpmConfig::default()).unwrap();
        assert!(base_tree.custom_root().children().is_empty());
    }

    #[test]
    fn unknown_source_property_fails() {
        let doc = Document::new().with_schema(
            SchemaDecl::new("Ns").with_item(
                EntityTypeDecl::new("E")
                    .with_key(&["Id"])
                    .with_property(id())
                    .with_feed_mapping(
                        FeedMappingDecl::syndication("SyndicationSummary", true)
                            .with_source("Nope"),
                    ),
            ),
        );
        let model = Model::new(doc);
        let e = model.find_type("Ns.E").unwrap();
        let err = build_target_tree(&model, e, &EpmConfig::default()).unwrap_err();
        assert_eq!(err.kind, EpmErrorKind::InvalidSourcePath);
    }
}
