#![forbid(unsafe_code)]

use std::rc::Rc;

use edm_ast::{FacetDecls, MaxLength, Srid};

use crate::error::EdmError;
use crate::ids::TypeId;
use crate::placeholder::{Checkable, Placeholder, Resolved};

/// Kind tag of a type definition. Never changes for a given definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    None,
    Primitive,
    Entity,
    Complex,
    Row,
    Collection,
    EntityReference,
    Enum,
}

macro_rules! primitive_kinds {
    ($($variant:ident),* $(,)?) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum PrimitiveKind {
            $($variant,)*
        }

        impl PrimitiveKind {
            pub const ALL: &'static [PrimitiveKind] = &[$(PrimitiveKind::$variant,)*];

            /// Unqualified name (`Int32`).
            pub fn name(&self) -> &'static str {
                match self {
                    $(PrimitiveKind::$variant => stringify!($variant),)*
                }
            }

            /// Looks up `Edm.<Name>`.
            pub fn from_qualified_name(name: &str) -> Option<Self> {
                let simple = name.strip_prefix("Edm.")?;
                match simple {
                    $(stringify!($variant) => Some(PrimitiveKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

primitive_kinds! {
    Binary,
    Boolean,
    Byte,
    DateTime,
    DateTimeOffset,
    Time,
    Decimal,
    Double,
    Single,
    Guid,
    Int16,
    Int32,
    Int64,
    SByte,
    String,
    Stream,
    Geography,
    GeographyPoint,
    GeographyLineString,
    GeographyPolygon,
    GeographyCollection,
    GeographyMultiPolygon,
    GeographyMultiLineString,
    GeographyMultiPoint,
    Geometry,
    GeometryPoint,
    GeometryLineString,
    GeometryPolygon,
    GeometryCollection,
    GeometryMultiPolygon,
    GeometryMultiLineString,
    GeometryMultiPoint,
}

/// Which facets a primitive kind accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacetFamily {
    None,
    String,
    Binary,
    Decimal,
    Temporal,
    Spatial,
}

impl PrimitiveKind {
    pub fn qualified_name(&self) -> String {
        format!("Edm.{}", self.name())
    }

    pub fn is_geography(&self) -> bool {
        use PrimitiveKind::*;
        matches!(
            self,
            Geography
                | GeographyPoint
                | GeographyLineString
                | GeographyPolygon
                | GeographyCollection
                | GeographyMultiPolygon
                | GeographyMultiLineString
                | GeographyMultiPoint
        )
    }

    pub fn is_geometry(&self) -> bool {
        use PrimitiveKind::*;
        matches!(
            self,
            Geometry
                | GeometryPoint
                | GeometryLineString
                | GeometryPolygon
                | GeometryCollection
                | GeometryMultiPolygon
                | GeometryMultiLineString
                | GeometryMultiPoint
        )
    }

    pub fn is_spatial(&self) -> bool {
        self.is_geography() || self.is_geometry()
    }

    pub fn is_integral(&self) -> bool {
        use PrimitiveKind::*;
        matches!(self, Byte | SByte | Int16 | Int32 | Int64)
    }

    /// Inclusive value range of integral kinds.
    pub fn integral_range(&self) -> Option<(i64, i64)> {
        use PrimitiveKind::*;
        match self {
            Byte => Some((0, i64::from(u8::MAX))),
            SByte => Some((i64::from(i8::MIN), i64::from(i8::MAX))),
            Int16 => Some((i64::from(i16::MIN), i64::from(i16::MAX))),
            Int32 => Some((i64::from(i32::MIN), i64::from(i32::MAX))),
            Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    pub fn facet_family(&self) -> FacetFamily {
        use PrimitiveKind::*;
        match self {
            String => FacetFamily::String,
            Binary => FacetFamily::Binary,
            Decimal => FacetFamily::Decimal,
            DateTime | DateTimeOffset | Time => FacetFamily::Temporal,
            k if k.is_spatial() => FacetFamily::Spatial,
            _ => FacetFamily::None,
        }
    }

    /// Spatial kinds this kind accepts as values, itself excluded.
    ///
    /// The geography and geometry halves mirror each other: the abstract
    /// root accepts every concrete shape, the collection accepts the three
    /// multi-shapes, and every other shape accepts only itself.
    pub fn spatial_subtypes(&self) -> &'static [PrimitiveKind] {
        use PrimitiveKind::*;
        match self {
            Geography => &[
                GeographyPoint,
                GeographyLineString,
                GeographyPolygon,
                GeographyCollection,
                GeographyMultiPoint,
                GeographyMultiLineString,
                GeographyMultiPolygon,
            ],
            GeographyCollection => &[
                GeographyMultiPoint,
                GeographyMultiLineString,
                GeographyMultiPolygon,
            ],
            Geometry => &[
                GeometryPoint,
                GeometryLineString,
                GeometryPolygon,
                GeometryCollection,
                GeometryMultiPoint,
                GeometryMultiLineString,
                GeometryMultiPolygon,
            ],
            GeometryCollection => &[
                GeometryMultiPoint,
                GeometryMultiLineString,
                GeometryMultiPolygon,
            ],
            _ => &[],
        }
    }

    /// Nearest spatial kind that accepts this one.
    pub fn spatial_parent(&self) -> Option<PrimitiveKind> {
        use PrimitiveKind::*;
        match self {
            GeographyPoint | GeographyLineString | GeographyPolygon | GeographyCollection => {
                Some(Geography)
            }
            GeographyMultiPoint | GeographyMultiLineString | GeographyMultiPolygon => {
                Some(GeographyCollection)
            }
            GeometryPoint | GeometryLineString | GeometryPolygon | GeometryCollection => {
                Some(Geometry)
            }
            GeometryMultiPoint | GeometryMultiLineString | GeometryMultiPolygon => {
                Some(GeometryCollection)
            }
            _ => None,
        }
    }

    /// Identity, or both spatial with `sub` listed under `self`.
    pub fn is_assignable_from(&self, sub: PrimitiveKind) -> bool {
        if *self == sub {
            return true;
        }
        self.is_spatial() && sub.is_spatial() && self.spatial_subtypes().contains(&sub)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringFacets {
    pub max_length: Option<MaxLength>,
    pub is_unicode: Option<bool>,
    pub is_fixed_length: Option<bool>,
    pub collation: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BinaryFacets {
    pub max_length: Option<MaxLength>,
    pub is_fixed_length: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecimalFacets {
    pub precision: Option<u32>,
    pub scale: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemporalFacets {
    pub precision: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpatialFacets {
    pub srid: Option<Srid>,
}

/// Facets of a primitive type reference; the variant follows the kind's
/// [`FacetFamily`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PrimitiveFacets {
    #[default]
    None,
    String(StringFacets),
    Binary(BinaryFacets),
    Decimal(DecimalFacets),
    Temporal(TemporalFacets),
    Spatial(SpatialFacets),
}

impl PrimitiveFacets {
    /// Keeps the declared facets that apply to `kind`.
    pub fn from_decls(kind: PrimitiveKind, decls: &FacetDecls) -> Self {
        match kind.facet_family() {
            FacetFamily::None => PrimitiveFacets::None,
            FacetFamily::String => PrimitiveFacets::String(StringFacets {
                max_length: decls.max_length,
                is_unicode: decls.unicode,
                is_fixed_length: decls.fixed_length,
                collation: decls.collation.clone(),
            }),
            FacetFamily::Binary => PrimitiveFacets::Binary(BinaryFacets {
                max_length: decls.max_length,
                is_fixed_length: decls.fixed_length,
            }),
            FacetFamily::Decimal => PrimitiveFacets::Decimal(DecimalFacets {
                precision: decls.precision,
                scale: decls.scale,
            }),
            FacetFamily::Temporal => PrimitiveFacets::Temporal(TemporalFacets {
                precision: decls.precision,
            }),
            FacetFamily::Spatial => PrimitiveFacets::Spatial(SpatialFacets { srid: decls.srid }),
        }
    }

    pub fn default_for(kind: PrimitiveKind) -> Self {
        Self::from_decls(kind, &FacetDecls::default())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowColumn {
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeDefinition {
    Primitive {
        kind: PrimitiveKind,
        facets: PrimitiveFacets,
    },
    Entity(Resolved<TypeId>),
    Complex(Resolved<TypeId>),
    Enum(Resolved<TypeId>),
    /// `is_atomic` marks collections of primitive or enum values.
    Collection {
        element: Box<TypeRef>,
        is_atomic: bool,
    },
    EntityReference(Resolved<TypeId>),
    Row(Vec<RowColumn>),
    /// A named type that could not be found, so its kind is unknown.
    None(Rc<Placeholder>),
}

/// A use of a type: its definition plus nullability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeRef {
    pub definition: TypeDefinition,
    pub nullable: bool,
}

impl TypeRef {
    pub fn primitive(kind: PrimitiveKind, nullable: bool) -> Self {
        Self {
            definition: TypeDefinition::Primitive {
                kind,
                facets: PrimitiveFacets::default_for(kind),
            },
            nullable,
        }
    }

    pub fn entity(id: TypeId, nullable: bool) -> Self {
        Self {
            definition: TypeDefinition::Entity(Resolved::Element(id)),
            nullable,
        }
    }

    pub fn complex(id: TypeId, nullable: bool) -> Self {
        Self {
            definition: TypeDefinition::Complex(Resolved::Element(id)),
            nullable,
        }
    }

    pub fn collection(element: TypeRef, nullable: bool) -> Self {
        let is_atomic = matches!(
            element.definition,
            TypeDefinition::Primitive { .. } | TypeDefinition::Enum(_)
        );
        Self {
            definition: TypeDefinition::Collection {
                element: Box::new(element),
                is_atomic,
            },
            nullable,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match &self.definition {
            TypeDefinition::Primitive { .. } => TypeKind::Primitive,
            TypeDefinition::Entity(_) => TypeKind::Entity,
            TypeDefinition::Complex(_) => TypeKind::Complex,
            TypeDefinition::Enum(_) => TypeKind::Enum,
            TypeDefinition::Collection { .. } => TypeKind::Collection,
            TypeDefinition::EntityReference(_) => TypeKind::EntityReference,
            TypeDefinition::Row(_) => TypeKind::Row,
            TypeDefinition::None(_) => TypeKind::None,
        }
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match &self.definition {
            TypeDefinition::Primitive { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Entity or complex type id, when resolved.
    pub fn structured_id(&self) -> Option<TypeId> {
        match &self.definition {
            TypeDefinition::Entity(r) | TypeDefinition::Complex(r) => r.element(),
            _ => None,
        }
    }

    pub fn collection_element(&self) -> Option<&TypeRef> {
        match &self.definition {
            TypeDefinition::Collection { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Same definition and facets, different nullability.
    pub fn with_nullable(&self, nullable: bool) -> TypeRef {
        let definition = match &self.definition {
            TypeDefinition::Primitive { kind, facets } => TypeDefinition::Primitive {
                kind: *kind,
                facets: facets.clone(),
            },
            other => other.clone(),
        };
        TypeRef {
            definition,
            nullable,
        }
    }

    /// Errors of every placeholder reachable from this reference.
    pub fn errors(&self) -> Vec<EdmError> {
        let mut out = Vec::new();
        self.collect_errors(&mut out);
        out
    }

    fn collect_errors(&self, out: &mut Vec<EdmError>) {
        match &self.definition {
            TypeDefinition::Primitive { .. } => {}
            TypeDefinition::Entity(r)
            | TypeDefinition::Complex(r)
            | TypeDefinition::Enum(r)
            | TypeDefinition::EntityReference(r) => out.extend_from_slice(r.errors()),
            TypeDefinition::Collection { element, .. } => element.collect_errors(out),
            TypeDefinition::Row(columns) => {
                for c in columns {
                    c.ty.collect_errors(out);
                }
            }
            TypeDefinition::None(p) => out.extend_from_slice(p.errors()),
        }
    }
}
