//! Consequence firing integration tests
//!
//! Compiles rules, builds match chains over session facts, and fires them.

use std::sync::{Arc, Mutex};

use consequent::compiler::{
    ActionBody, CompilerConfig, ConsequenceCompiler, ConsequenceUnit, Declaration,
    DeclarationResolver, Effect, Field, MatchChain, MatchNode, RuleDescriptor, fire,
};
use consequent::foundation::{DataSource, ErrorKind, FactHandle, FactObject, Type, Value};
use consequent::session::{EntryPointDataProcessor, GlobalTypes, Session, SessionConfig};

type Calls = Arc<Mutex<Vec<Vec<Value>>>>;

fn recording(signature: Vec<Type>) -> (ActionBody, Calls) {
    let calls: Calls = Arc::default();
    let sink = Arc::clone(&calls);
    let action = ActionBody::new("Rules", "consequence", signature, move |_, args| {
        sink.lock().unwrap().push(args.to_vec());
        Ok(())
    });
    (action, calls)
}

fn compiler() -> ConsequenceCompiler {
    ConsequenceCompiler::new(CompilerConfig::reproducible(77).with_package("org.shop"))
}

/// Inserts `value` into the session and returns it as a chain node.
fn node(session: &mut Session, value: Value) -> MatchNode {
    let handle = session.insert(value.clone()).unwrap();
    MatchNode::new(handle, value)
}

// =============================================================================
// Three-pattern rule
// =============================================================================

#[test]
fn three_pattern_rule_fires_with_every_binding() {
    let mut session = Session::new();
    let customer = Value::from(FactObject::with_fields("Customer", [("name", Value::from("Ann"))]));
    let order = Value::from(FactObject::with_fields("Order", [("total", Value::Int(120))]));
    let item = Value::from(FactObject::with_fields("Item", [("sku", Value::from("A-1"))]));

    let root = node(&mut session, customer.clone());
    let middle = node(&mut session, order.clone());
    let tip = node(&mut session, item.clone());
    let handles = [root.handle, middle.handle, tip.handle];
    let chain: MatchChain = [root, middle, tip].into_iter().collect();

    let declarations = vec![
        Declaration::direct("$c", Type::fact("Customer"), 2, 0),
        Declaration::direct("$o", Type::fact("Order"), 1, 1),
        Declaration::direct("$i", Type::fact("Item"), 0, 2),
    ];

    let plan = DeclarationResolver::plan(&declarations, 2).unwrap();
    let resolution =
        DeclarationResolver::resolve(&plan, &chain, &session.memory().unwrap()).unwrap();
    assert_eq!(resolution.visits, 3);
    assert_eq!(resolution.deepest, 2);

    let (action, calls) = recording(vec![
        Type::fact("Customer"),
        Type::Handle,
        Type::fact("Order"),
        Type::Handle,
        Type::fact("Item"),
        Type::Handle,
    ]);
    let unit = compiler()
        .compile(
            &RuleDescriptor::new("big orders"),
            &declarations,
            &GlobalTypes::new(),
            action,
        )
        .unwrap();

    let report = fire(&unit, &chain, &mut session).unwrap();
    assert_eq!(report.unit, unit.identify());
    assert!(report.effects.is_empty());

    let calls = calls.lock().unwrap();
    assert_eq!(
        calls[0],
        vec![
            customer,
            Value::from(handles[0]),
            order,
            Value::from(handles[1]),
            item,
            Value::from(handles[2]),
        ]
    );
}

// =============================================================================
// Indirect bindings outside working memory
// =============================================================================

#[test]
fn unknown_extracted_object_passes_nils() {
    let mut session = Session::new();
    let address = Value::from(FactObject::with_fields("Address", [("city", Value::from("Rome"))]));
    let person = Value::from(FactObject::with_fields(
        "Person",
        [("name", Value::from("Mario")), ("address", address)],
    ));
    let chain = MatchChain::root(node(&mut session, person));

    let (action, calls) = recording(vec![Type::option(Type::fact("Address")), Type::Handle]);
    let unit = compiler()
        .compile(
            &RuleDescriptor::new("addresses"),
            &[Declaration::indirect(
                "$addr",
                Type::option(Type::fact("Address")),
                0,
                0,
                Arc::new(Field::new("address")),
            )],
            &GlobalTypes::new(),
            action,
        )
        .unwrap();

    fire(&unit, &chain, &mut session).unwrap();
    assert_eq!(calls.lock().unwrap()[0], vec![Value::Nil, Value::Nil]);
}

#[test]
fn extracted_object_found_after_insertion() {
    let mut session = Session::new();
    let address = Value::from(FactObject::with_fields("Address", [("city", Value::from("Rome"))]));
    let person = Value::from(FactObject::with_fields("Person", [("address", address.clone())]));
    let chain = MatchChain::root(node(&mut session, person));

    let (action, calls) = recording(vec![Type::option(Type::fact("Address")), Type::Handle]);
    let unit = compiler()
        .compile(
            &RuleDescriptor::new("addresses"),
            &[Declaration::indirect(
                "$addr",
                Type::option(Type::fact("Address")),
                0,
                0,
                Arc::new(Field::new("address")),
            )],
            &GlobalTypes::new(),
            action,
        )
        .unwrap();

    fire(&unit, &chain, &mut session).unwrap();
    let handle = session.insert(address.clone()).unwrap();
    // Same chain, recomputed against the changed working memory
    fire(&unit, &chain, &mut session).unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0], vec![Value::Nil, Value::Nil]);
    assert_eq!(calls[1], vec![address, Value::from(handle)]);
}

// =============================================================================
// Type mismatches
// =============================================================================

#[test]
fn mismatch_fails_one_firing_only() {
    let mut session = Session::new();
    let (action, calls) = recording(vec![Type::fact("Person"), Type::Handle]);
    let unit = compiler()
        .compile(
            &RuleDescriptor::new("people"),
            &[Declaration::direct("$p", Type::fact("Person"), 0, 0)],
            &GlobalTypes::new(),
            action,
        )
        .unwrap();

    let dog = Value::from(FactObject::new("Dog"));
    let bad = MatchChain::root(node(&mut session, dog));
    let err = fire(&unit, &bad, &mut session).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    let ctx = err.context.unwrap();
    assert_eq!(ctx.rule.as_deref(), Some("people"));
    assert_eq!(ctx.artifact.as_deref(), Some(unit.identify()));

    let person = Value::from(FactObject::new("Person"));
    let good = MatchChain::root(node(&mut session, person));
    fire(&unit, &good, &mut session).unwrap();
    assert_eq!(calls.lock().unwrap().len(), 1);
}

// =============================================================================
// Effects
// =============================================================================

#[test]
fn effects_apply_after_the_action() {
    let mut session = Session::new();
    let mario = Value::from(FactObject::with_fields("Person", [("age", Value::Int(40))]));
    let chain = MatchChain::root(node(&mut session, mario));

    let action = ActionBody::new(
        "Rules",
        "birthday",
        vec![Type::fact("Person"), Type::Handle],
        |helper, args| {
            let (Some(person), Some(handle)) = (args[0].as_fact(), args[1].as_handle()) else {
                return Ok(());
            };
            let age = person.get("age").and_then(Value::as_int).unwrap_or_default();
            helper.update(handle, person.set("age", Value::Int(age + 1)));
            helper.insert_into("greetings", Value::from("happy birthday"));
            Ok(())
        },
    );
    let unit = compiler()
        .compile(
            &RuleDescriptor::new("birthday"),
            &[Declaration::direct("$p", Type::fact("Person"), 0, 0)],
            &GlobalTypes::new(),
            action,
        )
        .unwrap();

    let report = fire(&unit, &chain, &mut session).unwrap();
    assert_eq!(report.effects.len(), 2);
    assert!(matches!(report.effects[0], Effect::Update { .. }));
    assert_eq!(report.inserted.len(), 1);

    let handle: FactHandle = chain.tip().unwrap().handle;
    let memory = session.memory().unwrap();
    let updated = memory.get(handle).and_then(Value::as_fact).unwrap();
    assert_eq!(updated.get("age"), Some(&Value::Int(41)));
    drop(memory);

    let greetings = session.find_entry_point("greetings").unwrap();
    assert_eq!(greetings.objects().unwrap(), vec![Value::from("happy birthday")]);
}

#[test]
fn failing_effect_leaves_memory_untouched() {
    let mut session = Session::new();
    let dead = session.insert(Value::Int(0)).unwrap();
    session.memory_mut().unwrap().retract(dead).unwrap();

    let mario = Value::from(FactObject::with_fields("Person", [("age", Value::Int(40))]));
    let chain = MatchChain::root(node(&mut session, mario.clone()));

    let action = ActionBody::new(
        "Rules",
        "cleanup",
        vec![Type::fact("Person"), Type::Handle],
        move |helper, args| {
            if let Some(handle) = args[1].as_handle() {
                helper.update(handle, Value::from("replaced"));
            }
            helper.insert(Value::Int(42));
            helper.retract(dead);
            Ok(())
        },
    );
    let unit = compiler()
        .compile(
            &RuleDescriptor::new("cleanup"),
            &[Declaration::direct("$p", Type::fact("Person"), 0, 0)],
            &GlobalTypes::new(),
            action,
        )
        .unwrap();

    let err = fire(&unit, &chain, &mut session).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::FactNotFound(h) if h == dead));
    assert_eq!(err.context.unwrap().artifact.as_deref(), Some(unit.identify()));

    let memory = session.memory().unwrap();
    assert_eq!(memory.len(), 1);
    assert_eq!(memory.get(chain.tip().unwrap().handle), Some(&mario));
    assert_eq!(memory.handle_of(&Value::Int(42)), None);
}

// =============================================================================
// Data sources inside action bodies
// =============================================================================

#[test]
fn action_can_publish_to_a_bound_source() {
    let mut session =
        Session::with_config(SessionConfig::default().with_global("results", Type::Source));
    let results = DataSource::new();
    results
        .subscribe(Arc::new(EntryPointDataProcessor::new(
            session.entry_point("results"),
        )))
        .unwrap();
    session
        .set_global("results", Value::from(results.clone()))
        .unwrap();

    let mario = Value::from(FactObject::with_fields("Person", [("name", Value::from("Mario"))]));
    let chain = MatchChain::root(node(&mut session, mario));

    let action = ActionBody::new(
        "Rules",
        "publish",
        vec![Type::fact("Person"), Type::Handle, Type::Source],
        |_, args| {
            if let Some(source) = args[2].as_source() {
                source.append(Value::Int(1))?;
            }
            Ok(())
        },
    );
    let unit = compiler()
        .compile(
            &RuleDescriptor::new("publish").with_global("results"),
            &[Declaration::direct("$p", Type::fact("Person"), 0, 0)],
            &GlobalTypes::new().with("results", Type::Source),
            action,
        )
        .unwrap();

    let report = fire(&unit, &chain, &mut session).unwrap();
    assert!(report.effects.is_empty());
    assert_eq!(results.len(), 1);
    assert_eq!(
        session.find_entry_point("results").unwrap().objects().unwrap(),
        vec![Value::Int(1)]
    );
}
