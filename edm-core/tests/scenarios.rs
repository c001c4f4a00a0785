use edm_ast::{
    AssociationDecl, Document, EntityTypeDecl, Multiplicity, PropertyDecl, SchemaDecl, TypeExpr,
};
use edm_core::{EdmErrorCode, Model, ModelReport, Resolved, TypeRef};

fn int(name: &str) -> PropertyDecl {
    PropertyDecl::new(name, TypeExpr::named("Edm.Int32").not_null())
}

fn company() -> Model {
    Model::new(
        Document::new().with_schema(
            SchemaDecl::new("Company")
                .with_alias("C")
                .with_item(EntityTypeDecl::new("Person").with_key(&["Id"]).with_property(int("Id")))
                .with_item(
                    EntityTypeDecl::new("Employee")
                        .with_base("C.Person")
                        .with_property(PropertyDecl::new("Salary", TypeExpr::named("Edm.Decimal"))),
                )
                .with_item(
                    EntityTypeDecl::new("Department")
                        .with_key(&["Id"])
                        .with_property(int("Id"))
                        .with_property(int("ManagerId")),
                )
                .with_item(
                    AssociationDecl::new("Works")
                        .with_end("E1", "Person", Multiplicity::One)
                        .with_end("E2", "Department", Multiplicity::Many)
                        .with_constraint("E1", &["Id"], "E2", &["ManagerId"]),
                ),
        ),
    )
}

#[test]
fn employee_derives_from_person() {
    let m = company();
    let person = m.find_type("Company.Person").unwrap();
    let employee = m.find_type("Company.Employee").unwrap();
    let (p, e) = (TypeRef::entity(person, true), TypeRef::entity(employee, true));

    assert!(m.is_assignable_from(&p, &e));
    assert!(!m.is_assignable_from(&e, &p));
    assert_eq!(m.common_base_type(&p, &e), Some(p.clone()));
    assert_eq!(m.common_base_type(&e, &p), Some(p));
    assert_eq!(m.key(employee).len(), 1);
}

#[test]
fn works_dependents_follow_person_key() {
    let m = company();
    let works = m.find_association("Company.Works").unwrap();
    let dependents = m.compute_dependent_properties(works).unwrap();
    let names: Vec<_> = dependents.iter().map(|p| m.property_name(p)).collect();
    assert_eq!(names, ["ManagerId"]);
    assert!(dependents.iter().all(|p| matches!(p, Resolved::Element(_))));
    assert!(m.is_valid(), "{:?}", m.errors());
}

#[test]
fn self_and_mutual_base_cycles_become_placeholders() {
    let m = Model::new(
        Document::new().with_schema(
            SchemaDecl::new("Ns")
                .with_item(EntityTypeDecl::new("T").with_base("T"))
                .with_item(EntityTypeDecl::new("A").with_base("B"))
                .with_item(EntityTypeDecl::new("B").with_base("A"))
                .with_item(
                    EntityTypeDecl::new("C")
                        .with_base("A")
                        .with_key(&["Id"])
                        .with_property(int("Id")),
                ),
        ),
    );
    let t = |n: &str| m.find_type(&format!("Ns.{n}")).unwrap();

    for name in ["T", "A", "B"] {
        let base = m.base_type(t(name)).unwrap();
        assert!(base.is_cyclic(), "{name}");
        let errors = m.type_errors(t(name));
        assert!(
            errors.iter().any(|e| e.code == EdmErrorCode::CyclicBaseType),
            "{name}: {errors:?}"
        );
    }
    // C hangs off the cycle but is not on it.
    assert_eq!(m.base_type(t("C")), Some(Resolved::Element(t("A"))));
    assert_eq!(m.ancestors(t("T")).count(), 0);
}

#[test]
fn report_reflects_model_errors() {
    let m = Model::new(Document::new().with_schema(
        SchemaDecl::new("Ns").with_item(EntityTypeDecl::new("T").with_base("T")),
    ));
    let report = ModelReport::from_model(&m);
    assert!(!report.ok);
    assert!(report.diagnostics.iter().any(|d| d.code == "cyclic_base_type"));
    assert!(report.to_json().unwrap().contains("edm-model-report/v1"));

    let report = ModelReport::from_model(&company());
    assert!(report.ok);
    assert_eq!(report.namespaces, ["Company"]);
}
