//! Rule-unit compiler integration tests

use std::sync::Arc;

use consequent_compiler::{
    BindStatement, CompilerConfig, RuleUnitCompiler, RuleUnitDescription, UnitData, UnitVariable,
};
use consequent_foundation::{DataSource, ErrorKind, Type, Value};
use consequent_session::{Session, SessionConfig};

fn persons_unit() -> RuleUnitDescription {
    RuleUnitDescription::new("org.example", "Persons")
        .with_variable(UnitVariable::data_source("persons", "persons"))
        .with_variable(UnitVariable::data_source("orders", "orders"))
        .with_variable(UnitVariable::field("threshold", "threshold", Type::Int))
}

fn compiler() -> RuleUnitCompiler {
    RuleUnitCompiler::new(CompilerConfig::reproducible(21))
}

// =============================================================================
// Generated Artifacts
// =============================================================================

#[test]
fn bind_statements_follow_variable_order() {
    let (_, instance) = compiler().compile_unit(&persons_unit()).unwrap();
    let statements = instance.bind_statements();

    assert_eq!(
        statements,
        &[
            BindStatement::Subscribe {
                getter: "persons".into(),
                entry_point: "persons".into(),
            },
            BindStatement::SetGlobal {
                name: "persons".into(),
                getter: "persons".into(),
            },
            BindStatement::Subscribe {
                getter: "orders".into(),
                entry_point: "orders".into(),
            },
            BindStatement::SetGlobal {
                name: "orders".into(),
                getter: "orders".into(),
            },
            BindStatement::SetGlobal {
                name: "threshold".into(),
                getter: "threshold".into(),
            },
        ]
    );
}

#[test]
fn unit_without_variables_has_empty_bind() {
    let (unit, instance) = compiler()
        .compile_unit(&RuleUnitDescription::new("org.example", "Empty"))
        .unwrap();
    assert!(instance.bind_statements().is_empty());
    assert!(instance.source().contains("rule_unit: Empty) {}"));
    assert_eq!(unit.unit_type(), "org.example.Empty");
}

#[test]
fn configured_package_applies_to_unpackaged_units() {
    let compiler =
        RuleUnitCompiler::new(CompilerConfig::reproducible(1).with_package("org.fallback"));
    let (unit, instance) = compiler
        .compile_unit(&RuleUnitDescription::new("", "Loose"))
        .unwrap();
    assert!(unit.qualified_name().starts_with("org.fallback.LooseRuleUnit"));
    assert!(instance.path().starts_with("org/fallback/LooseRuleUnitInstance"));
}

#[test]
fn custom_model_name_is_rendered() {
    let description = persons_unit().with_model("PersonsRules");
    let (unit, _) = compiler().compile_unit(&description).unwrap();
    assert!(unit.source().contains("PersonsRules::new()"));
    assert!(!unit.source().contains("PersonsModel"));
}

// =============================================================================
// Binding
// =============================================================================

#[test]
fn bind_wires_sources_and_globals() {
    let (unit, _) = compiler().compile_unit(&persons_unit()).unwrap();
    let persons = DataSource::new();
    let orders = DataSource::new();
    persons.append(Value::from("early")).unwrap();

    let data = UnitData::new()
        .with("persons", persons.clone())
        .with("orders", orders.clone())
        .with("threshold", Value::Int(10));
    let mut session =
        Session::with_config(SessionConfig::default().with_global("threshold", Type::Int));
    let instance = unit.create_instance(Arc::new(data), &mut session).unwrap();

    orders.append(Value::Int(99)).unwrap();

    let entry_persons = session.find_entry_point("persons").unwrap();
    let entry_orders = session.find_entry_point("orders").unwrap();
    assert_eq!(entry_persons.objects().unwrap(), vec![Value::from("early")]);
    assert_eq!(entry_orders.objects().unwrap(), vec![Value::Int(99)]);
    assert_eq!(session.get_global("threshold"), Some(&Value::Int(10)));
    assert_eq!(instance.data().get("threshold"), Some(Value::Int(10)));
}

#[test]
fn missing_accessor_fails_binding() {
    let (unit, _) = compiler().compile_unit(&persons_unit()).unwrap();
    let data = UnitData::new().with("persons", DataSource::new());
    let mut session = Session::new();

    let err = unit.create_instance(Arc::new(data), &mut session).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MissingAccessor(ref g) if g == "orders"));
}

#[test]
fn non_source_cannot_be_subscribed() {
    let (unit, _) = compiler().compile_unit(&persons_unit()).unwrap();
    let data = UnitData::new()
        .with("persons", Value::from("not a stream"))
        .with("orders", DataSource::new())
        .with("threshold", Value::Int(1));
    let mut session = Session::new();

    let err = unit.create_instance(Arc::new(data), &mut session).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::TypeMismatch {
            expected: Type::Source,
            ..
        }
    ));
}

#[test]
fn session_global_types_reject_bad_fields() {
    let description = persons_unit();
    let (unit, _) = compiler().compile_unit(&description).unwrap();
    let data = UnitData::new()
        .with("persons", DataSource::new())
        .with("orders", DataSource::new())
        .with("threshold", Value::from("ten"));

    let mut config = SessionConfig::default();
    config.globals = description.global_types();
    let mut session = Session::with_config(config);

    let err = unit.create_instance(Arc::new(data), &mut session).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
}
