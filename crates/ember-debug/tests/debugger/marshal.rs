//! Value marshaler tests: summaries, field enumeration, parsing.

use ember_debug::marshal::{marshal, object_fields, parse_value, summary, UNREADABLE};
use ember_debug::{DebugValue, ObjectRegistry};
use ember_wire::{ObjectReference, VirtualMachine, WireError, WireValue};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

use super::support::{FakeClass, FakeVm};

#[rstest]
#[case(WireValue::Null, "null")]
#[case(WireValue::Boolean(true), "true")]
#[case(WireValue::Boolean(false), "false")]
#[case(WireValue::Byte(-4), "-4")]
#[case(WireValue::Short(300), "300")]
#[case(WireValue::Int(42), "42")]
#[case(WireValue::Long(-7_000_000_000), "-7000000000")]
#[case(WireValue::Float(1.5), "1.5")]
#[case(WireValue::Double(-0.25), "-0.25")]
#[case(WireValue::Char('x'), "'x'")]
fn test_primitive_summaries(#[case] value: WireValue, #[case] expected: &str) {
    assert_eq!(summary(&value), expected);
}

#[test]
fn test_string_summary_is_quoted() {
    let (vm, _queue) = FakeVm::new();
    let value = WireValue::String(vm.new_string("abc"));
    assert_eq!(summary(&value), "\"abc\"");
}

#[test]
fn test_short_array_renders_all_elements() {
    let (vm, _queue) = FakeVm::new();
    let array = vm.new_array(
        "int",
        vec![WireValue::Int(1), WireValue::Int(2), WireValue::Int(3)],
    );
    assert_eq!(summary(&WireValue::Array(array)), "[1, 2, 3]");
}

#[test]
fn test_long_array_elides_tail() {
    let (vm, _queue) = FakeVm::new();
    let array = vm.new_array(
        "int",
        (1..=5).map(WireValue::Int).collect(),
    );
    assert_eq!(summary(&WireValue::Array(array)), "[1, 2, 3, ...]");
}

#[test]
fn test_empty_array_summary() {
    let (vm, _queue) = FakeVm::new();
    let array = vm.new_array("int", Vec::new());
    assert_eq!(summary(&WireValue::Array(array)), "[]");
}

#[test]
fn test_object_summary_uses_last_name_component() {
    let (vm, _queue) = FakeVm::new();
    let class = FakeClass::new("demo.model.Account", Some("Account.scala"));
    let object = vm.new_object(&class);
    assert_eq!(summary(&WireValue::Object(object)), "Instance of Account");
}

#[test]
fn test_ref_box_summary_recurses_into_elem() {
    let (vm, _queue) = FakeVm::new();
    let class = FakeClass::new("scala.runtime.IntRef", Some("IntRef.scala"));
    let boxed = vm.new_object(&class);
    boxed.set_field("elem", WireValue::Int(7));
    assert_eq!(summary(&WireValue::Object(boxed)), "7");
}

#[test]
fn test_ref_box_requires_the_name_pattern() {
    let (vm, _queue) = FakeVm::new();
    // No package prefix: not a reference box even with an `elem` field.
    let class = FakeClass::new("IntRef", None);
    let object = vm.new_object(&class);
    object.set_field("elem", WireValue::Int(7));
    assert_eq!(summary(&WireValue::Object(object)), "Instance of IntRef");

    // Wrong casing in the stem.
    let class = FakeClass::new("demo.INTRef", None);
    let object = vm.new_object(&class);
    object.set_field("elem", WireValue::Int(7));
    assert_eq!(summary(&WireValue::Object(object)), "Instance of INTRef");
}

#[test]
fn test_field_enumeration_walks_superclass_chain() {
    let (vm, _queue) = FakeVm::new();
    let base = FakeClass::new("demo.Base", Some("Base.scala"));
    base.add_field("base_count", "int", false);
    let class = FakeClass::new("demo.Sub", Some("Sub.scala"));
    class.set_superclass(base);
    class.add_field("name", "java.lang.String", false);
    class.add_field("MAX", "int", true);
    class.set_static("MAX", WireValue::Int(99));

    let object = vm.new_object(&class);
    object.set_field("name", WireValue::String(vm.new_string("ada")));
    object.set_field("base_count", WireValue::Int(3));

    let object: Arc<dyn ObjectReference> = object;
    let fields = object_fields(&object);
    let rendered: Vec<(i32, &str, &str)> = fields
        .iter()
        .map(|f| (f.index, f.name.as_str(), f.summary.as_str()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            (0, "name", "\"ada\""),
            (1, "MAX", "99"),
            (2, "base_count", "3"),
        ]
    );
}

#[test]
fn test_missing_field_value_renders_placeholder() {
    let (vm, _queue) = FakeVm::new();
    let class = FakeClass::new("demo.Holey", Some("Holey.scala"));
    class.add_field("ghost", "int", false);
    let object = vm.new_object(&class);
    let object: Arc<dyn ObjectReference> = object;

    let fields = object_fields(&object);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].summary, UNREADABLE);
}

#[test]
fn test_marshal_remembers_object_ids() {
    let (vm, _queue) = FakeVm::new();
    let mut objects = ObjectRegistry::new();

    let class = FakeClass::new("demo.Account", Some("Account.scala"));
    let object = vm.new_object(&class);
    let object_id = {
        let value = WireValue::Object(object);
        match marshal(&value, &mut objects) {
            DebugValue::Object { object_id, type_name, .. } => {
                assert_eq!(type_name, "demo.Account");
                object_id
            }
            other => panic!("expected Object, got {other:?}"),
        }
    };
    assert!(objects.lookup(object_id).is_some());

    let array = vm.new_array("int", vec![WireValue::Int(1)]);
    let value = WireValue::Array(array);
    match marshal(&value, &mut objects) {
        DebugValue::Array {
            length,
            element_type_name,
            object_id,
            ..
        } => {
            assert_eq!(length, 1);
            assert_eq!(element_type_name, "int");
            assert!(objects.lookup(object_id).is_some());
        }
        other => panic!("expected Array, got {other:?}"),
    }
}

#[test]
fn test_marshal_primitives_and_null() {
    let mut objects = ObjectRegistry::new();
    assert_eq!(marshal(&WireValue::Null, &mut objects), DebugValue::Null);
    assert_eq!(
        marshal(&WireValue::Int(5), &mut objects),
        DebugValue::Primitive {
            summary: "5".to_string(),
            type_name: "int".to_string(),
        }
    );
    assert!(objects.is_empty());
}

#[rstest]
#[case("boolean", "true", "true")]
#[case("boolean", "  false  ", "false")]
#[case("byte", "-3", "-3")]
#[case("short", "1200", "1200")]
#[case("int", "42", "42")]
#[case("long", "9000000000", "9000000000")]
#[case("float", "1.5", "1.5")]
#[case("double", "-2.75", "-2.75")]
#[case("char", "z", "'z'")]
#[case("char", "'z'", "'z'")]
fn test_parse_then_summarize_round_trip(
    #[case] type_name: &str,
    #[case] text: &str,
    #[case] expected: &str,
) {
    let (vm, _queue) = FakeVm::new();
    let vm = vm as std::sync::Arc<dyn VirtualMachine>;
    let value = parse_value(&vm, type_name, text).expect("parse");
    assert_eq!(summary(&value), expected);
}

#[test]
fn test_parse_string_strips_one_quote_pair() {
    let (vm, _queue) = FakeVm::new();
    let vm = vm as std::sync::Arc<dyn VirtualMachine>;

    let value = parse_value(&vm, "java.lang.String", "\"abc\"").expect("parse");
    assert_eq!(summary(&value), "\"abc\"");

    // Unquoted input is taken verbatim.
    let value = parse_value(&vm, "java.lang.String", "abc").expect("parse");
    assert_eq!(summary(&value), "\"abc\"");
}

#[test]
fn test_parse_rejects_bad_literals() {
    let (vm, _queue) = FakeVm::new();
    let vm = vm as std::sync::Arc<dyn VirtualMachine>;
    assert!(parse_value(&vm, "int", "forty-two").is_err());
    assert!(parse_value(&vm, "boolean", "yes").is_err());
    assert!(parse_value(&vm, "char", "ab").is_err());
    assert!(parse_value(&vm, "char", "").is_err());
}

#[test]
fn test_parse_unsupported_type() {
    let (vm, _queue) = FakeVm::new();
    let vm = vm as std::sync::Arc<dyn VirtualMachine>;
    match parse_value(&vm, "demo.Account", "whatever") {
        Err(WireError::Unsupported(_)) => {}
        other => panic!("expected Unsupported, got {other:?}"),
    }
}
