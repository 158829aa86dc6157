//! Value, type, and fact integration tests

use consequent_foundation::{FactHandle, FactObject, PMap, PVec, Type, Value};

// =============================================================================
// Type Conformance
// =============================================================================

#[test]
fn nil_conforms_only_to_nullable_types() {
    assert!(Value::Nil.conforms_to(&Type::option(Type::fact("Person"))));
    assert!(Value::Nil.conforms_to(&Type::Any));
    assert!(!Value::Nil.conforms_to(&Type::fact("Person")));
    assert!(!Value::Nil.conforms_to(&Type::Handle));
}

#[test]
fn int_promotes_to_float() {
    assert!(Value::Int(3).conforms_to(&Type::Float));
    assert!(!Value::Float(3.0).conforms_to(&Type::Int));
}

#[test]
fn fact_types_match_by_name() {
    let person = Value::from(FactObject::new("Person"));
    assert!(person.conforms_to(&Type::fact("Person")));
    assert!(!person.conforms_to(&Type::fact("Address")));
    assert_eq!(person.value_type(), Type::fact("Person"));
}

#[test]
fn runtime_collections_fit_typed_collections() {
    let list: PVec<Value> = [Value::Int(1), Value::Int(2)].into_iter().collect();
    assert!(Value::Vec(list).conforms_to(&Type::vec(Type::Int)));

    let map: PMap<Value, Value> = [(Value::from("k"), Value::Int(1))].into_iter().collect();
    assert!(Value::Map(map).conforms_to(&Type::map(Type::String, Type::Int)));
}

// =============================================================================
// Fact Identity
// =============================================================================

#[test]
fn cloned_facts_share_identity() {
    let mario = FactObject::with_fields("Person", [("name", Value::from("Mario"))]);
    let alias = mario.clone();
    assert!(mario.same(&alias));
    assert_eq!(mario.identity(), alias.identity());
}

#[test]
fn equal_facts_are_distinct_instances() {
    let a = FactObject::with_fields("Person", [("name", Value::from("Mario"))]);
    let b = FactObject::with_fields("Person", [("name", Value::from("Mario"))]);
    assert_eq!(a, b);
    assert!(!a.same(&b));
}

#[test]
fn set_produces_new_instance() {
    let mario = FactObject::with_fields("Person", [("age", Value::Int(40))]);
    let older = mario.set("age", Value::Int(41));
    assert!(!mario.same(&older));
    assert_eq!(mario.get("age"), Some(&Value::Int(40)));
    assert_eq!(older.get("age"), Some(&Value::Int(41)));
}

// =============================================================================
// Formatting
// =============================================================================

#[test]
fn display_forms() {
    let mario = FactObject::with_fields(
        "Person",
        [("name", Value::from("Mario")), ("age", Value::Int(40))],
    );
    assert_eq!(Value::from(mario).to_string(), "Person(age: 40, name: Mario)");
    assert_eq!(Value::from(FactHandle::new(7, 1)).to_string(), "Fact(7)");
    assert_eq!(format!("{:?}", FactHandle::new(7, 1)), "FactHandle(7@1)");
    assert_eq!(Value::Nil.to_string(), "nil");
}

#[test]
fn optional_handle_converts_to_nil() {
    assert_eq!(Value::from(None::<FactHandle>), Value::Nil);
    let handle = FactHandle::new(2, 0);
    assert_eq!(Value::from(Some(handle)).as_handle(), Some(handle));
}
