#![forbid(unsafe_code)]

macro_rules! define_ids {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub struct $name(pub u32);

            impl $name {
                pub fn index(self) -> usize {
                    self.0 as usize
                }

                pub(crate) fn from_index(index: usize) -> Self {
                    Self(u32::try_from(index).expect("model arena exceeds u32 handles"))
                }
            }
        )*
    };
}

define_ids! {
    SchemaId,
    /// Entity, complex or enum type declared in a schema.
    TypeId,
    /// Structural or navigation property.
    PropertyId,
    AssociationId,
    FunctionId,
    TermId,
    ContainerId,
    EntitySetId,
    AssociationSetId,
    FunctionImportId,
    AnnotationId,
}

/// Any element of the model that can carry errors and annotations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementRef {
    Schema(SchemaId),
    Type(TypeId),
    Property(PropertyId),
    Association(AssociationId),
    Function(FunctionId),
    Term(TermId),
    Container(ContainerId),
    EntitySet(EntitySetId),
    AssociationSet(AssociationSetId),
    FunctionImport(FunctionImportId),
}

/// Elements that live inside an entity container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContainerElement {
    EntitySet(EntitySetId),
    AssociationSet(AssociationSetId),
    FunctionImport(FunctionImportId),
}

impl From<ContainerElement> for ElementRef {
    fn from(e: ContainerElement) -> Self {
        match e {
            ContainerElement::EntitySet(id) => ElementRef::EntitySet(id),
            ContainerElement::AssociationSet(id) => ElementRef::AssociationSet(id),
            ContainerElement::FunctionImport(id) => ElementRef::FunctionImport(id),
        }
    }
}
