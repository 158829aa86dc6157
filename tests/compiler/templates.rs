//! Template specialization integration tests

use std::collections::BTreeSet;

use consequent_compiler::template::{
    BIND_METHOD, Expr, Method, Param, RULE_UNIT_INSTANCE_TEMPLATE, RULE_UNIT_TEMPLATE, Stmt,
    TypeRef, render,
};
use consequent_compiler::{ClassDecl, Placeholder, Specializer, TemplateRegistry};
use consequent_foundation::ErrorKind;

fn unit_skeleton() -> ClassDecl {
    TemplateRegistry::builtin()
        .get(RULE_UNIT_TEMPLATE)
        .unwrap()
        .clone()
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn builtin_registry_has_both_skeletons() {
    let registry = TemplateRegistry::builtin();
    let names: Vec<_> = registry.names().collect();
    assert_eq!(names, vec![RULE_UNIT_INSTANCE_TEMPLATE, RULE_UNIT_TEMPLATE]);
}

#[test]
fn unknown_template_is_missing() {
    let err = TemplateRegistry::empty().get("Nope").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingTemplate(ref n) if n == "Nope"));
    assert!(err.is_build_error());
}

#[test]
fn skeleton_slots() {
    let slots = unit_skeleton().placeholders();
    assert_eq!(slots, Placeholder::ALL.into_iter().collect::<BTreeSet<_>>());

    let registry = TemplateRegistry::builtin();
    let instance = registry.get(RULE_UNIT_INSTANCE_TEMPLATE).unwrap();
    assert_eq!(
        instance.placeholders(),
        [Placeholder::ClassName, Placeholder::RuleUnitClass]
            .into_iter()
            .collect::<BTreeSet<_>>()
    );
    assert!(instance.method(BIND_METHOD).unwrap().body.is_empty());
}

// =============================================================================
// Specialization
// =============================================================================

#[test]
fn every_slot_must_be_filled() {
    let err = Specializer::new(&unit_skeleton())
        .unwrap()
        .fill(Placeholder::ClassName, "UnitRuleUnit1")
        .fill(Placeholder::RuleUnitClass, "Unit")
        .fill(Placeholder::RuleUnitInstanceClass, "UnitRuleUnitInstance1")
        .finish()
        .unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::MissingPlaceholder { ref slot, .. } if slot == Placeholder::RuleUnitModel.as_str()
    ));
}

#[test]
fn concrete_class_name_is_malformed() {
    let skeleton = ClassDecl::template("Fixed").with_name(TypeRef::named("Fixed"));
    let err = Specializer::new(&skeleton).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedTemplate { .. }));
}

#[test]
fn replace_body_needs_the_method() {
    let err = Specializer::new(&unit_skeleton())
        .unwrap()
        .replace_body(BIND_METHOD, vec![])
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedTemplate { ref reason, .. } if reason.contains("bind")));
}

#[test]
fn slots_inside_bodies_are_substituted() {
    let skeleton = ClassDecl::template("Echo").with_method(Method {
        name: "make".into(),
        receiver: false,
        params: vec![Param::new("v", TypeRef::Slot(Placeholder::RuleUnitClass))],
        returns: Some(TypeRef::Slot(Placeholder::ClassName)),
        body: vec![Stmt::Return(Expr::New {
            ty: TypeRef::Slot(Placeholder::ClassName),
            args: vec![Expr::name("v")],
        })],
    });
    let class = Specializer::new(&skeleton)
        .unwrap()
        .fill(Placeholder::ClassName, "Echo1")
        .fill(Placeholder::RuleUnitClass, "Data")
        .finish()
        .unwrap();

    assert!(class.placeholders().is_empty());
    let text = render(&class);
    assert!(text.contains("pub fn make(v: Data) -> Echo1 {"));
    assert!(text.contains("Echo1::new(v)"));
}

#[test]
fn specializing_leaves_the_skeleton_untouched() {
    let skeleton = unit_skeleton();
    let _ = Specializer::new(&skeleton)
        .unwrap()
        .fill(Placeholder::ClassName, "A")
        .fill(Placeholder::RuleUnitClass, "B")
        .fill(Placeholder::RuleUnitInstanceClass, "C")
        .fill(Placeholder::RuleUnitModel, "D")
        .package("p")
        .finish()
        .unwrap();
    assert_eq!(skeleton.placeholders().len(), Placeholder::ALL.len());
    assert_eq!(skeleton.package(), None);
}
