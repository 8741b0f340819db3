//! Location resolver tests.

use std::path::Path;
use std::sync::Arc;

use ember_debug::LocationResolver;
use ember_wire::ReferenceType;

use super::support::FakeClass;

#[test]
fn test_register_returns_declared_source_key() {
    let mut resolver = LocationResolver::new();
    let class = FakeClass::new("pkg.Foo", Some("Foo.scala"));
    assert_eq!(
        resolver.register(class as Arc<dyn ReferenceType>),
        Some("Foo.scala".to_string())
    );
    assert_eq!(resolver.len(), 1);
}

#[test]
fn test_register_without_source_info_is_skipped() {
    let mut resolver = LocationResolver::new();
    let class = FakeClass::new("pkg.Synthetic", None);
    assert_eq!(resolver.register(class as Arc<dyn ReferenceType>), None);
    assert!(resolver.is_empty());
}

#[test]
fn test_locations_match_line_and_source() {
    let mut resolver = LocationResolver::new();
    let class = FakeClass::new("pkg.Foo", Some("Foo.scala"));
    class.add_method("main", &[9, 10, 11]);
    resolver.register(class as Arc<dyn ReferenceType>);

    let hits = resolver.locations(Path::new("/proj/src/Foo.scala"), 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].type_name, "pkg.Foo");
    assert_eq!(hits[0].line, Some(10));

    assert!(resolver.locations(Path::new("/proj/src/Foo.scala"), 99).is_empty());
    assert!(resolver.locations(Path::new("/proj/src/Bar.scala"), 10).is_empty());
}

#[test]
fn test_duplicate_positions_are_collapsed() {
    let mut resolver = LocationResolver::new();
    let class = FakeClass::new("pkg.Foo", Some("Foo.scala"));
    // Two methods covering the same line produce one installable location.
    class.add_method("apply", &[10]);
    class.add_method("main", &[10]);
    resolver.register(class as Arc<dyn ReferenceType>);

    let hits = resolver.locations(Path::new("Foo.scala"), 10);
    assert_eq!(hits.len(), 1);
}

#[test]
fn test_methods_without_line_tables_are_tolerated() {
    let mut resolver = LocationResolver::new();
    let class = FakeClass::new("pkg.Foo", Some("Foo.scala"));
    class.add_opaque_method("synthetic$1");
    class.add_method("main", &[10]);
    resolver.register(class as Arc<dyn ReferenceType>);

    assert_eq!(resolver.locations(Path::new("Foo.scala"), 10).len(), 1);
}

#[test]
fn test_nested_classes_register_under_their_own_key() {
    let mut resolver = LocationResolver::new();
    let outer = FakeClass::new("pkg.Foo", Some("Foo.scala"));
    outer.add_method("main", &[10]);
    let nested = FakeClass::new("pkg.Foo$Inner", Some("Foo.scala"));
    nested.add_method("run", &[20]);
    resolver.register(outer as Arc<dyn ReferenceType>);
    resolver.register(nested as Arc<dyn ReferenceType>);

    assert_eq!(resolver.len(), 1);
    assert_eq!(resolver.locations(Path::new("Foo.scala"), 20).len(), 1);
}

#[test]
fn test_re_registering_a_class_is_idempotent() {
    let mut resolver = LocationResolver::new();
    let class = FakeClass::new("pkg.Foo", Some("Foo.scala"));
    class.add_method("main", &[10]);
    resolver.register(class.clone() as Arc<dyn ReferenceType>);
    resolver.register(class as Arc<dyn ReferenceType>);

    assert_eq!(resolver.locations(Path::new("Foo.scala"), 10).len(), 1);
}
