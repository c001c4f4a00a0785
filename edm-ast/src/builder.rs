#![forbid(unsafe_code)]

//! Convenience constructors for building documents in code.
//!
//! Readers that produce the tree from a file fill in real spans; everything
//! built here uses [`no_span`] unless `at` is called.

use crate::*;

fn name(s: impl Into<String>) -> QualifiedName {
    Spanned::new(no_span(), s.into())
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: SchemaDecl) -> Self {
        self.schemas.push(schema);
        self
    }
}

impl SchemaDecl {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            namespace: ident(namespace),
            alias: None,
            usings: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(ident(alias));
        self
    }

    pub fn with_using(mut self, namespace: impl Into<String>, alias: Option<&str>) -> Self {
        self.usings.push(UsingDecl {
            span: no_span(),
            namespace: ident(namespace),
            alias: alias.map(ident),
        });
        self
    }

    pub fn with_item(mut self, item: impl Into<SchemaItem>) -> Self {
        self.items.push(item.into());
        self
    }
}

macro_rules! schema_item_from {
    ($($decl:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$decl> for SchemaItem {
                fn from(d: $decl) -> Self {
                    SchemaItem::$variant(d)
                }
            }
        )*
    };
}

schema_item_from! {
    EntityTypeDecl => EntityType,
    ComplexTypeDecl => ComplexType,
    EnumTypeDecl => EnumType,
    AssociationDecl => Association,
    FunctionDecl => Function,
    ValueTermDecl => ValueTerm,
    EntityContainerDecl => EntityContainer,
    AnnotationsDecl => Annotations,
}

impl TypeExpr {
    pub fn named(type_name: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            nullable: true,
            kind: TypeExprKind::Named {
                name: name(type_name),
                facets: FacetDecls::default(),
            },
        }
    }

    pub fn collection(element: TypeExpr) -> Self {
        Self {
            span: no_span(),
            nullable: true,
            kind: TypeExprKind::Collection(Box::new(element)),
        }
    }

    pub fn entity_ref(entity_type: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            nullable: true,
            kind: TypeExprKind::EntityReference(name(entity_type)),
        }
    }

    pub fn row(columns: Vec<(&str, TypeExpr)>) -> Self {
        Self {
            span: no_span(),
            nullable: true,
            kind: TypeExprKind::Row(
                columns
                    .into_iter()
                    .map(|(n, ty)| RowColumnDecl {
                        span: no_span(),
                        name: ident(n),
                        ty,
                    })
                    .collect(),
            ),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_facets(mut self, new_facets: FacetDecls) -> Self {
        if let TypeExprKind::Named { facets, .. } = &mut self.kind {
            *facets = new_facets;
        }
        self
    }
}

impl EntityTypeDecl {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            name: ident(type_name),
            base_type: None,
            is_abstract: false,
            is_open: false,
            key: Vec::new(),
            properties: Vec::new(),
            navigation_properties: Vec::new(),
            feed_mappings: Vec::new(),
            annotations: Vec::new(),
            documentation: None,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base_type = Some(name(base));
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn open_type(mut self) -> Self {
        self.is_open = true;
        self
    }

    pub fn with_key(mut self, keys: &[&str]) -> Self {
        self.key = keys.iter().map(|k| ident(*k)).collect();
        self
    }

    pub fn with_property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_navigation(mut self, nav: NavigationPropertyDecl) -> Self {
        self.navigation_properties.push(nav);
        self
    }

    pub fn with_feed_mapping(mut self, mapping: FeedMappingDecl) -> Self {
        self.feed_mappings.push(mapping);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationDecl) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_documentation(mut self, summary: impl Into<String>) -> Self {
        self.documentation = Some(Documentation {
            summary: Some(summary.into()),
            long_description: None,
        });
        self
    }
}

impl ComplexTypeDecl {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            name: ident(type_name),
            base_type: None,
            is_abstract: false,
            properties: Vec::new(),
            annotations: Vec::new(),
            documentation: None,
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base_type = Some(name(base));
        self
    }

    pub fn with_property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }
}

impl PropertyDecl {
    pub fn new(prop_name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            span: no_span(),
            name: ident(prop_name),
            ty,
            default_value: None,
            concurrency_fixed: false,
            feed_mapping: None,
            annotations: Vec::new(),
            documentation: None,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_feed_mapping(mut self, mapping: FeedMappingDecl) -> Self {
        self.feed_mapping = Some(mapping);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationDecl) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl NavigationPropertyDecl {
    pub fn new(
        nav_name: impl Into<String>,
        relationship: impl Into<String>,
        from_role: impl Into<String>,
        to_role: impl Into<String>,
    ) -> Self {
        Self {
            span: no_span(),
            name: ident(nav_name),
            relationship: name(relationship),
            from_role: ident(from_role),
            to_role: ident(to_role),
            annotations: Vec::new(),
            documentation: None,
        }
    }
}

impl EnumTypeDecl {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            name: ident(type_name),
            underlying_type: None,
            is_flags: false,
            members: Vec::new(),
            annotations: Vec::new(),
            documentation: None,
        }
    }

    pub fn with_underlying(mut self, underlying: impl Into<String>) -> Self {
        self.underlying_type = Some(name(underlying));
        self
    }

    pub fn flags(mut self) -> Self {
        self.is_flags = true;
        self
    }

    pub fn with_member(mut self, member: impl Into<String>, value: Option<i64>) -> Self {
        self.members.push(EnumMemberDecl {
            span: no_span(),
            name: ident(member),
            value,
        });
        self
    }
}

impl AssociationDecl {
    pub fn new(assoc_name: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            name: ident(assoc_name),
            ends: Vec::new(),
            referential_constraint: None,
            annotations: Vec::new(),
            documentation: None,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_end(
        mut self,
        role: impl Into<String>,
        entity_type: impl Into<String>,
        multiplicity: Multiplicity,
    ) -> Self {
        self.ends.push(AssociationEndDecl {
            span: no_span(),
            role: ident(role),
            entity_type: name(entity_type),
            multiplicity,
            on_delete: OnDeleteAction::None,
        });
        self
    }

    pub fn with_constraint(
        mut self,
        principal_role: impl Into<String>,
        principal_properties: &[&str],
        dependent_role: impl Into<String>,
        dependent_properties: &[&str],
    ) -> Self {
        let role = |r: String, props: &[&str]| ConstraintRoleDecl {
            span: no_span(),
            role: ident(r),
            properties: props.iter().map(|p| ident(*p)).collect(),
        };
        self.referential_constraint = Some(ReferentialConstraintDecl {
            span: no_span(),
            principal: role(principal_role.into(), principal_properties),
            dependent: role(dependent_role.into(), dependent_properties),
        });
        self
    }
}

impl FunctionDecl {
    pub fn new(fn_name: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            name: ident(fn_name),
            parameters: Vec::new(),
            return_type: None,
            defining_expression: None,
            annotations: Vec::new(),
            documentation: None,
        }
    }

    pub fn with_parameter(mut self, param: impl Into<String>, ty: TypeExpr) -> Self {
        self.parameters.push(ParameterDecl {
            span: no_span(),
            name: ident(param),
            ty,
        });
        self
    }

    pub fn returning(mut self, ty: TypeExpr) -> Self {
        self.return_type = Some(ty);
        self
    }
}

impl ValueTermDecl {
    pub fn new(term_name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            span: no_span(),
            name: ident(term_name),
            ty,
            annotations: Vec::new(),
            documentation: None,
        }
    }
}

impl EntityContainerDecl {
    pub fn new(container_name: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            name: ident(container_name),
            extends: None,
            is_default: false,
            entity_sets: Vec::new(),
            association_sets: Vec::new(),
            function_imports: Vec::new(),
            annotations: Vec::new(),
            documentation: None,
        }
    }

    pub fn extending(mut self, base: impl Into<String>) -> Self {
        self.extends = Some(name(base));
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn with_entity_set(
        mut self,
        set: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        self.entity_sets.push(EntitySetDecl {
            span: no_span(),
            name: ident(set),
            entity_type: name(entity_type),
            annotations: Vec::new(),
            documentation: None,
        });
        self
    }

    pub fn with_association_set(
        mut self,
        set: impl Into<String>,
        association: impl Into<String>,
        ends: &[(&str, &str)],
    ) -> Self {
        self.association_sets.push(AssociationSetDecl {
            span: no_span(),
            name: ident(set),
            association: name(association),
            ends: ends
                .iter()
                .map(|(role, entity_set)| AssociationSetEndDecl {
                    span: no_span(),
                    role: ident(*role),
                    entity_set: ident(*entity_set),
                })
                .collect(),
            annotations: Vec::new(),
            documentation: None,
        });
        self
    }

    pub fn with_function_import(mut self, import: FunctionImportDecl) -> Self {
        self.function_imports.push(import);
        self
    }
}

impl FunctionImportDecl {
    pub fn new(import_name: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            name: ident(import_name),
            return_type: None,
            entity_set: None,
            parameters: Vec::new(),
            is_side_effecting: false,
            annotations: Vec::new(),
            documentation: None,
        }
    }

    pub fn returning(mut self, ty: TypeExpr) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn with_entity_set(mut self, set: impl Into<String>) -> Self {
        self.entity_set = Some(ident(set));
        self
    }

    pub fn with_parameter(mut self, param: impl Into<String>, ty: TypeExpr) -> Self {
        self.parameters.push(ParameterDecl {
            span: no_span(),
            name: ident(param),
            ty,
        });
        self
    }
}

impl AnnotationsDecl {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            span: no_span(),
            target: name(target),
            qualifier: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_annotation(mut self, annotation: AnnotationDecl) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl AnnotationDecl {
    pub fn new(term: impl Into<String>, value: Expr) -> Self {
        Self {
            span: no_span(),
            term: name(term),
            qualifier: None,
            value,
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(ident(qualifier));
        self
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            span: no_span(),
            kind,
        }
    }
}

impl FeedMappingDecl {
    /// Mapping onto a syndication item (`SyndicationTitle`, `SyndicationAuthorName`, ...).
    pub fn syndication(item: impl Into<String>, keep_in_content: bool) -> Self {
        Self {
            span: no_span(),
            source_path: None,
            target_path: item.into(),
            content_kind: None,
            keep_in_content,
            ns_prefix: None,
            ns_uri: None,
        }
    }

    /// Mapping onto a custom element/attribute path in a foreign namespace.
    pub fn custom(
        target_path: impl Into<String>,
        prefix: impl Into<String>,
        uri: impl Into<String>,
        keep_in_content: bool,
    ) -> Self {
        Self {
            span: no_span(),
            source_path: None,
            target_path: target_path.into(),
            content_kind: None,
            keep_in_content,
            ns_prefix: Some(prefix.into()),
            ns_uri: Some(uri.into()),
        }
    }

    pub fn with_source(mut self, source_path: impl Into<String>) -> Self {
        self.source_path = Some(source_path.into());
        self
    }

    pub fn with_content_kind(mut self, kind: impl Into<String>) -> Self {
        self.content_kind = Some(kind.into());
        self
    }
}
