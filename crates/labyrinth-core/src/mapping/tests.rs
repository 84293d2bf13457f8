//! Tests for mapping compilation and execution
//!
//! Copyright (c) 2025 Labyrinth Team
//! Licensed under the Apache-2.0 license

use super::*;
use crate::config::MapperConfig;
use crate::expression::{Lambda, TypeError};
use crate::Error;

#[derive(Debug, Clone, Default)]
struct Note {
    title: Option<String>,
    content: Option<String>,
    revision: i64,
}

#[derive(Debug, Clone, Default)]
struct Request {
    id: i32,
    owner: i32,
    revision: i32,
    comment: Option<String>,
    label: String,
    note: Note,
    extra: Option<Note>,
    priority: Option<i32>,
    estimate: Option<i32>,
}

#[derive(Debug, Clone, Default)]
struct Entity {
    id: i32,
    owner: i32,
    revision: i64,
    comment: Option<String>,
    title: Option<String>,
    content: Option<String>,
    label: Option<String>,
    heading: String,
    score: i32,
    note: Note,
    priority: Option<i32>,
    estimate: i32,
}

crate::impl_shape!(Note {
    title: Option<String>,
    content: Option<String>,
    revision: i64,
});

crate::impl_shape!(Request {
    id: i32,
    owner: i32,
    revision: i32,
    comment: Option<String>,
    label: String,
    note: Note,
    extra: Option<Note>,
    priority: Option<i32>,
    estimate: Option<i32>,
});

crate::impl_shape!(Entity {
    id: i32,
    owner: i32,
    revision: i64,
    comment: Option<String>,
    title: Option<String>,
    content: Option<String>,
    label: Option<String>,
    heading: String,
    score: i32,
    note: Note,
    priority: Option<i32>,
    estimate: i32,
});

fn request() -> Request {
    Request {
        id: 7,
        owner: 3,
        revision: 2,
        comment: Some("hello".to_string()),
        label: "urgent".to_string(),
        note: Note {
            title: Some("Title".to_string()),
            content: None,
            revision: 11,
        },
        extra: None,
        priority: None,
        estimate: None,
    }
}

fn source(build: impl FnOnce(&crate::expression::Expr) -> crate::expression::Expr) -> Lambda {
    Lambda::new::<Request>(build)
}

fn dest(field: &str) -> Lambda {
    let field = field.to_string();
    Lambda::new::<Entity>(move |e| e.field(field))
}

fn compile(definition: MappingDefinition<Entity, Request>) -> CompiledMapping<Entity, Request> {
    definition.compile(&MapperConfig::default()).unwrap()
}

#[test]
fn test_auto_map_source_copies_exact_matches_only() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition.auto_map(source(|p| p.clone())).unwrap();
    let mapping = compile(definition);

    let entity = mapping.map(&request()).unwrap();
    assert_eq!(entity.id, 7);
    assert_eq!(entity.owner, 3);
    assert_eq!(entity.comment.as_deref(), Some("hello"));
    assert_eq!(entity.note.revision, 11);
    // i32 -> i64 and String -> Option<String> are not auto-mapped.
    assert_eq!(entity.revision, 0);
    assert_eq!(entity.label, None);

    let Step::AutoMap(step) = &mapping.plan().steps()[0] else {
        panic!("expected an auto-map step");
    };
    assert!(matches!(step.source(), AutoSource::Source));
    assert_eq!(step.skipped_fields(), &["revision", "label", "extra", "estimate"]);
}

#[test]
fn test_auto_map_nested_record() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition.auto_map(source(|p| p.field("note"))).unwrap();
    let mapping = compile(definition);

    let entity = mapping.map(&request()).unwrap();
    assert_eq!(entity.title.as_deref(), Some("Title"));
    assert_eq!(entity.content, None);
    assert_eq!(entity.revision, 11);
    assert_eq!(entity.id, 0);
}

#[test]
fn test_auto_map_absent_intermediate_skips_block() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .auto_map(source(|p| p.field("note")))
        .unwrap()
        .auto_map(source(|p| p.field("extra")))
        .unwrap();
    let mapping = compile(definition);

    let entity = mapping.map(&request()).unwrap();
    assert_eq!(entity.title.as_deref(), Some("Title"));
    assert_eq!(entity.revision, 11);

    let mut present = request();
    present.extra = Some(Note {
        title: None,
        content: Some("extra body".to_string()),
        revision: 40,
    });
    let entity = mapping.map(&present).unwrap();
    // Absent optionals inside the later block keep earlier values.
    assert_eq!(entity.title.as_deref(), Some("Title"));
    assert_eq!(entity.content.as_deref(), Some("extra body"));
    assert_eq!(entity.revision, 40);
}

#[test]
fn test_auto_map_of_non_record_is_a_contract_violation() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition.auto_map(source(|p| p.field("label"))).unwrap();
    let err = definition.compile(&MapperConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Contract { .. }));
    assert!(err.is_configuration_error());
}

#[test]
fn test_property_rule_overrides_auto_map() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .auto_map(source(|p| p.clone()))
        .unwrap()
        .map_property(source(|p| p.field("owner")), dest("id"))
        .unwrap();
    let entity = compile(definition).map(&request()).unwrap();
    assert_eq!(entity.id, 3);
}

#[test]
fn test_absent_optional_does_not_overwrite() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_property(source(|p| p.field("comment")), dest("content"))
        .unwrap()
        .map_property(source(|p| p.field("note").field("content")), dest("content"))
        .unwrap();
    let mapping = compile(definition);

    let entity = mapping.map(&request()).unwrap();
    assert_eq!(entity.content.as_deref(), Some("hello"));

    let Step::Property(step) = &mapping.plan().steps()[1] else {
        panic!("expected a property step");
    };
    assert_eq!(step.guard(), Guard::SkipAbsent);
    assert!(step.is_computed());
}

#[test]
fn test_optional_into_plain_field() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_property(source(|p| p.field("comment")), dest("heading"))
        .unwrap();
    let mapping = compile(definition);

    assert_eq!(mapping.map(&request()).unwrap().heading, "hello");

    let mut absent = request();
    absent.comment = None;
    assert_eq!(mapping.map(&absent).unwrap().heading, "");
}

#[test]
fn test_optional_integer_into_plain_field() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_property(source(|p| p.field("estimate")), dest("estimate"))
        .unwrap();
    let mapping = compile(definition);

    assert_eq!(mapping.map(&request()).unwrap().estimate, 0);

    let mut present = request();
    present.estimate = Some(5);
    assert_eq!(mapping.map(&present).unwrap().estimate, 5);

    let Step::Property(step) = &mapping.plan().steps()[0] else {
        panic!("expected a property step");
    };
    assert_eq!(step.guard(), Guard::SkipAbsent);
}

#[test]
fn test_auto_map_optional_integer() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition.auto_map(source(|p| p.clone())).unwrap();
    let mapping = compile(definition);

    let entity = mapping.map(&request()).unwrap();
    assert_eq!(entity.priority, None);
    assert_eq!(entity.estimate, 0);

    let mut present = request();
    present.priority = Some(5);
    present.estimate = Some(9);
    let entity = mapping.map(&present).unwrap();
    assert_eq!(entity.priority, Some(5));
    // Option<i32> -> i32 needs an explicit rule.
    assert_eq!(entity.estimate, 0);
}

#[test]
fn test_optional_integer_keeps_earlier_value_when_absent() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_property(source(|p| p.field("owner")), dest("estimate"))
        .unwrap()
        .map_property(source(|p| p.field("estimate")), dest("estimate"))
        .unwrap();
    let mapping = compile(definition);

    assert_eq!(mapping.map(&request()).unwrap().estimate, 3);

    let mut present = request();
    present.estimate = Some(5);
    assert_eq!(mapping.map(&present).unwrap().estimate, 5);
}

#[test]
fn test_plain_into_optional_field() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_property(source(|p| p.field("label")), dest("label"))
        .unwrap();
    let entity = compile(definition).map(&request()).unwrap();
    assert_eq!(entity.label.as_deref(), Some("urgent"));
}

#[test]
fn test_same_property() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_same_property(source(|p| p.field("owner")))
        .unwrap()
        .map_same_property(source(|p| p.field("note")))
        .unwrap();
    let entity = compile(definition).map(&request()).unwrap();
    assert_eq!(entity.owner, 3);
    assert_eq!(entity.note.title.as_deref(), Some("Title"));
    assert_eq!(entity.id, 0);
}

#[test]
fn test_computed_property() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_property(source(|p| p.field("id") * 10 + p.field("owner")), dest("score"))
        .unwrap();
    let entity = compile(definition).map(&request()).unwrap();
    assert_eq!(entity.score, 73);
}

#[test]
fn test_runtime_failure_names_target_field() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_property(source(|p| p.field("id") / p.field("revision")), dest("score"))
        .unwrap();
    let mapping = compile(definition);

    let mut zero = request();
    zero.revision = 0;
    match mapping.map(&zero).unwrap_err() {
        Error::Evaluation { target_field, .. } => assert_eq!(target_field, "score"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(mapping.map(&request()).unwrap().score, 3);
}

#[test]
fn test_incompatible_types_fail_compilation() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_property(source(|p| p.field("revision")), dest("revision"))
        .unwrap();
    let err = definition.compile(&MapperConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        Error::Type(TypeError::Incompatible { ref field, .. }) if field == "revision"
    ));
}

#[test]
fn test_unknown_fields_fail_compilation() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_property(source(|p| p.field("id")), dest("missing"))
        .unwrap();
    let err = definition.compile(&MapperConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Type(TypeError::UnknownField { shape: "Entity", .. })));

    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition.map_same_property(source(|p| p.field("score"))).unwrap();
    let err = definition.compile(&MapperConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Type(TypeError::UnknownField { shape: "Request", .. })));
}

#[test]
fn test_destination_must_be_member_read() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    let err = definition
        .map_property(
            source(|p| p.field("id")),
            Lambda::new::<Entity>(|e| e.field("note").field("title")),
        )
        .unwrap_err();
    assert!(matches!(err, Error::Contract { rule: Some(_), .. }));

    let err = definition
        .map_property(source(|p| p.field("id")), Lambda::new::<Entity>(|e| e.field("id") + 1))
        .unwrap_err();
    assert!(matches!(err, Error::Contract { .. }));
    assert_eq!(definition.rule_count(), 0);
}

#[test]
fn test_same_property_requires_member_read() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    let err = definition
        .map_same_property(source(|p| p.field("id") * 2))
        .unwrap_err();
    assert!(matches!(err, Error::Contract { .. }));
}

#[test]
fn test_parameter_shape_is_checked() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    let err = definition
        .auto_map(Lambda::new::<Entity>(|e| e.clone()))
        .unwrap_err();
    assert!(matches!(err, Error::Contract { .. }));

    let err = definition
        .map_property(source(|p| p.field("id")), Lambda::new::<Request>(|p| p.field("id")))
        .unwrap_err();
    assert!(matches!(err, Error::Contract { .. }));
}

#[test]
fn test_targets_are_fresh_per_call() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .map_property(source(|p| p.field("comment")), dest("comment"))
        .unwrap();
    let mapping = compile(definition);

    let first = mapping.map(&request()).unwrap();
    let mut absent = request();
    absent.comment = None;
    let second = mapping.map(&absent).unwrap();
    assert_eq!(first.comment.as_deref(), Some("hello"));
    assert_eq!(second.comment, None);
}

#[test]
fn test_plan_display_and_written_fields() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .auto_map(source(|p| p.field("note")))
        .unwrap()
        .map_property(source(|p| p.field("id")), dest("owner"))
        .unwrap()
        .map_property(source(|p| p.field("comment")), dest("title"))
        .unwrap();
    let mapping = compile(definition);
    let plan = mapping.plan();

    assert_eq!(plan.source().name(), "Request");
    assert_eq!(plan.target().name(), "Entity");
    assert_eq!(
        plan.steps()[0].written_fields(),
        vec!["title", "content", "revision"]
    );

    assert_eq!(
        plan.target_fields(),
        vec!["title", "content", "revision", "owner", "title"]
    );

    let text = plan.to_string();
    assert!(text.starts_with("Request -> Entity"));
    assert!(text.contains("auto source.note: title, content, revision"));
    assert!(text.contains("owner <- source.id"));
    assert!(text.contains("title <- source.comment [skip absent]"));
}

#[test]
fn test_diagnostic_switches_do_not_change_results() {
    let config = MapperConfig {
        log_plans: true,
        report_skipped_fields: true,
        warn_on_overrides: true,
    };
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .auto_map(source(|p| p.clone()))
        .unwrap()
        .map_same_property(source(|p| p.field("id")))
        .unwrap();
    let mapping = definition.compile(&config).unwrap();
    assert_eq!(mapping.plan().overridden_fields(), vec![("id", 2)]);
    assert_eq!(mapping.map(&request()).unwrap().id, 7);
}

#[test]
fn test_overridden_fields_counts_every_writer() {
    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition
        .auto_map(source(|p| p.field("note")))
        .unwrap()
        .map_property(source(|p| p.field("comment")), dest("title"))
        .unwrap()
        .map_property(source(|p| p.field("label")), dest("title"))
        .unwrap()
        .map_property(source(|p| p.field("id")), dest("score"))
        .unwrap();
    let mapping = compile(definition);
    assert_eq!(mapping.plan().overridden_fields(), vec![("title", 3)]);

    let mut definition = MappingDefinition::<Entity, Request>::new();
    definition.auto_map(source(|p| p.field("note"))).unwrap();
    assert!(compile(definition).plan().overridden_fields().is_empty());
}
