use edm_ast::{Document, EntityTypeDecl, PropertyDecl, SchemaDecl, TypeExpr};
use edm_core::{Model, PrimitiveKind, TypeId, TypeRef};
use proptest::{
    prelude::{any, prop},
    prop_assert, prop_assert_eq,
    sample::select,
    test_runner::{Config, TestRunner},
};

const CHAIN: usize = 6;

/// `T0 <- T1 <- ... <- T5`, each deriving from the previous one.
fn chain_model() -> (Model, Vec<TypeId>) {
    let mut schema = SchemaDecl::new("Ns").with_item(
        EntityTypeDecl::new("T0")
            .with_key(&["Id"])
            .with_property(PropertyDecl::new("Id", TypeExpr::named("Edm.Int32").not_null())),
    );
    for i in 1..CHAIN {
        schema = schema
            .with_item(EntityTypeDecl::new(format!("T{i}")).with_base(format!("T{}", i - 1)));
    }
    let m = Model::new(Document::new().with_schema(schema));
    let ids = (0..CHAIN).map(|i| m.find_type(&format!("Ns.T{i}")).unwrap()).collect();
    (m, ids)
}

fn runner() -> TestRunner {
    TestRunner::new(Config {
        cases: 128,
        ..Config::default()
    })
}

fn spatial_kinds() -> Vec<PrimitiveKind> {
    PrimitiveKind::ALL.iter().copied().filter(|k| k.is_spatial()).collect()
}

#[test]
fn spatial_assignability_is_antisymmetric() {
    let kinds = spatial_kinds();
    runner()
        .run(&(select(kinds.clone()), select(kinds)), |(a, b)| {
            prop_assert!(a.is_assignable_from(a));
            if a != b {
                prop_assert!(!(a.is_assignable_from(b) && b.is_assignable_from(a)));
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn common_base_is_symmetric_for_primitives() {
    let m = Model::new(Document::new());
    let kinds = select(PrimitiveKind::ALL);
    runner()
        .run(&(kinds.clone(), any::<bool>(), kinds, any::<bool>()), |(ka, na, kb, nb)| {
            let a = TypeRef::primitive(ka, na);
            let b = TypeRef::primitive(kb, nb);
            let ab = m.common_base_type(&a, &b);
            prop_assert_eq!(&ab, &m.common_base_type(&b, &a));
            if let Some(common) = ab {
                prop_assert!(m.is_assignable_from(&common, &a));
                prop_assert!(m.is_assignable_from(&common, &b));
                prop_assert_eq!(common.nullable, na || nb);
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn structured_assignability_follows_the_chain() {
    let (m, ids) = chain_model();
    runner()
        .run(&(0..CHAIN, 0..CHAIN, any::<bool>()), |(i, j, nullable)| {
            let a = TypeRef::entity(ids[i], nullable);
            let b = TypeRef::entity(ids[j], !nullable);
            prop_assert_eq!(m.is_assignable_from(&a, &b), i <= j);

            let common = m.common_base_type(&a, &b).unwrap();
            prop_assert_eq!(common.structured_id(), Some(ids[i.min(j)]));
            prop_assert_eq!(m.common_base_type(&b, &a), Some(common));

            let (ca, cb) = (TypeRef::collection(a, false), TypeRef::collection(b, false));
            prop_assert_eq!(m.is_assignable_from(&ca, &cb), i <= j);
            Ok(())
        })
        .unwrap();
}

#[test]
fn mismatched_kinds_never_assign() {
    let (m, ids) = chain_model();
    runner()
        .run(
            &(0..CHAIN, select(PrimitiveKind::ALL), prop::bool::ANY),
            |(i, kind, nullable)| {
                let entity = TypeRef::entity(ids[i], nullable);
                let complex = TypeRef::complex(ids[i], nullable);
                let primitive = TypeRef::primitive(kind, nullable);
                let collection = TypeRef::collection(primitive.clone(), nullable);
                let all = [&entity, &complex, &primitive, &collection];
                for (x, a) in all.iter().enumerate() {
                    for (y, b) in all.iter().enumerate() {
                        if x != y {
                            prop_assert!(!m.is_assignable_from(a, b));
                            prop_assert_eq!(m.common_base_type(a, b), None);
                        }
                    }
                }
                Ok(())
            },
        )
        .unwrap();
}
