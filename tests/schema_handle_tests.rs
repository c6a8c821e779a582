
use docmap::{
    Document, DocumentData, ErrorCategory, FieldValues, MapperConfig, SchemaRegistry, Value,
};
use fixtures::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

fn document(value: Value) -> DocumentData {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn values(value: Value) -> FieldValues {
    document(value).into_iter().collect()
}

fn field_set<E: Document>(registry: &SchemaRegistry) -> BTreeSet<String> {
    registry
        .handle::<E>()
        .unwrap()
        .field_names()
        .map(str::to_string)
        .collect()
}

#[test]
fn auto_key_type_compiles_to_expected_handle() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<TypeName>().unwrap();

    assert_eq!(
        field_set::<TypeName>(&registry),
        BTreeSet::from(["active".to_string(), "email".to_string()])
    );
    assert_eq!(handle.key_field_name(), "email");
    assert!(handle.is_auto_key());
    assert_eq!(handle.collection_name(), "TypeNames");
    assert!(handle.file_field_names().is_empty());
}

#[test]
fn handle_compilation_is_deterministic() {
    let first = SchemaRegistry::new();
    let second = SchemaRegistry::new();
    let a = first.handle::<Product>().unwrap();
    let b = second.handle::<Product>().unwrap();

    assert_eq!(a.collection_name(), b.collection_name());
    assert_eq!(
        a.field_names().collect::<Vec<_>>(),
        b.field_names().collect::<Vec<_>>()
    );
    assert_eq!(a.key_field_name(), b.key_field_name());

    let again = first.handle::<Product>().unwrap();
    assert!(Arc::ptr_eq(&a, &again));
}

#[test]
fn product_handle_records_markers() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Product>().unwrap();

    assert_eq!(handle.collection_name(), "catalog");
    assert_eq!(handle.key_field_name(), "sku");
    assert!(!handle.is_auto_key());
    assert!(!handle.has_field("views"));
    assert_eq!(handle.property_name("name"), Some("displayName"));
    assert_eq!(handle.property_name("price"), Some("price"));
    assert_eq!(
        handle.file_field_names(),
        BTreeSet::from(["photo", "manual"])
    );
    assert_eq!(handle.web_field_names(), BTreeSet::from(["photo"]));
    assert_eq!(
        handle
            .file_fields()
            .map(|field| (field.name(), field.content_type(), field.is_web()))
            .collect::<Vec<_>>(),
        vec![
            ("photo", Some("image/png"), true),
            ("manual", Some("application/pdf"), false),
        ]
    );
    assert_eq!(handle.content_type("photo"), Some("image/png"));
    assert_eq!(handle.content_type("manual"), Some("application/pdf"));
    assert_eq!(handle.content_type("name"), None);
    assert!(handle.converter("price").is_some());
    assert!(handle.converter("name").is_none());
    assert_eq!(handle.property_names().get("name"), Some(&"displayName"));
}

#[test]
fn inherited_fields_follow_shadowing() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Category>().unwrap();

    assert_eq!(
        handle.field_names().collect::<Vec<_>>(),
        vec!["label", "parent_id", "id", "created"]
    );
    assert_eq!(handle.key_field_name(), "id");
    assert_eq!(handle.collection_name(), "Categories");

    let category = handle
        .to_instance(&document(json!({
            "id": "c-1",
            "created": 1700000000,
            "label": "Lighting",
            "parentId": "c-0"
        })))
        .unwrap();
    assert_eq!(category.label, "Lighting");
    assert_eq!(category.base.label, "");
    assert_eq!(category.base.id, "c-1");
    assert_eq!(category.base.created, 1700000000);
    assert_eq!(category.parent_id.as_deref(), Some("c-0"));
}

#[test]
fn inheritance_chains_deeper_than_one_level() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Subcategory>().unwrap();
    assert_eq!(
        handle.field_names().collect::<Vec<_>>(),
        vec!["depth", "label", "parent_id", "id", "created"]
    );
    assert_eq!(handle.collection_name(), "Subcategories");

    let mut sub = Subcategory::default();
    handle.set_key_from_str(&mut sub, "s-9").unwrap();
    assert_eq!(sub.base.base.id, "s-9");
}

#[test]
fn unmapped_runtime_state_is_left_alone() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Upload>().unwrap();

    assert_eq!(
        field_set::<Upload>(&registry),
        BTreeSet::from(["id".to_string(), "path".to_string()])
    );
    assert!(!handle.has_field("open_file"));

    let upload = Upload {
        id: "u-1".to_string(),
        path: "/tmp/u-1".to_string(),
        ..Upload::default()
    };
    let data = handle.to_data(&upload, false, true).unwrap();
    assert_eq!(
        Value::Object(data.clone()),
        json!({ "id": "u-1", "path": "/tmp/u-1" })
    );

    let back = handle.to_instance(&data).unwrap();
    assert_eq!(back.path, "/tmp/u-1");
    assert!(back.open_file.is_none());
    assert_eq!(
        handle.get_field(&upload, "open_file").unwrap_err().category(),
        ErrorCategory::Usage
    );
}

#[test]
fn to_data_omits_files_unless_requested() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Product>().unwrap();
    let data = handle.to_data(&lamp(), false, false).unwrap();

    assert_eq!(
        Value::Object(data),
        json!({
            "sku": "LMP-001",
            "displayName": "Desk lamp",
            "price": 1999,
            "tags": "lighting,office",
            "dimensions": { "width": 12, "height": 40 }
        })
    );

    let with_files = handle.to_data(&lamp(), false, true).unwrap();
    assert_eq!(with_files.get("photo"), Some(&json!("products/lmp-001.png")));
    assert_eq!(with_files.get("manual"), Some(&Value::Null));
}

#[test]
fn to_data_key_presence_follows_ignore_key() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<TypeName>().unwrap();
    let fresh = TypeName {
        active: true,
        email: None,
    };

    let with_key = handle.to_data(&fresh, false, true).unwrap();
    assert_eq!(with_key.get("email"), Some(&Value::Null));

    let without_key = handle.to_data(&fresh, true, true).unwrap();
    assert!(!without_key.contains_key("email"));
    assert_eq!(without_key.get("active"), Some(&Value::Bool(true)));

    let product = registry.handle::<Product>().unwrap();
    let data = product.to_data(&lamp(), true, false).unwrap();
    assert!(!data.contains_key("sku"));
}

#[test]
fn document_round_trip_preserves_fields() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Product>().unwrap();
    let original = lamp();

    let data = handle.to_data(&original, false, true).unwrap();
    let restored = handle.to_instance(&data).unwrap();
    assert_eq!(restored, original);

    let category = Category {
        base: Entity {
            id: "c-2".to_string(),
            created: 5,
            label: String::new(),
        },
        label: "Desks".to_string(),
        parent_id: None,
    };
    let handle = registry.handle::<Category>().unwrap();
    let data = handle.to_data(&category, false, true).unwrap();
    assert_eq!(handle.to_instance(&data).unwrap(), category);
}

#[test]
fn to_instance_keeps_defaults_for_missing_and_null_properties() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Product>().unwrap();
    let product = handle
        .to_instance(&document(json!({
            "sku": "X",
            "displayName": null,
            "price": 250,
            "unrelated": true
        })))
        .unwrap();

    assert_eq!(product.sku, "X");
    assert_eq!(product.name, "");
    assert_eq!(product.price, Money { cents: 250 });
    assert!(product.tags.is_empty());
    assert_eq!(product.dimensions, Dimensions::default());
}

#[test]
fn to_instance_rejects_mistyped_values() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Product>().unwrap();
    let err = handle
        .to_instance(&document(json!({ "sku": "X", "price": "cheap" })))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Conversion);
}

#[test]
fn to_values_reverses_conversion_by_field_name() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Product>().unwrap();
    let preview = handle
        .to_values(&document(json!({
            "displayName": "Floor lamp",
            "price": 4500,
            "tags": "a,b",
            "photo": "p.png",
            "unknownProperty": 1
        })))
        .unwrap();

    assert_eq!(
        preview,
        values(json!({
            "name": "Floor lamp",
            "price": { "cents": 4500 },
            "tags": ["a", "b"],
            "photo": "p.png"
        }))
    );
}

#[test]
fn partial_update_renames_and_converts() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Product>().unwrap();
    let data = handle
        .to_partial_data(&values(json!({
            "name": "Reading lamp",
            "price": { "cents": 2599 },
            "dimensions.width": 14,
            "name.locale": "en"
        })))
        .unwrap();

    assert_eq!(
        Value::Object(data),
        json!({
            "displayName": "Reading lamp",
            "price": 2599,
            "dimensions.width": 14,
            "displayName.locale": "en"
        })
    );
}

#[test]
fn partial_update_refuses_key_and_file_fields() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Product>().unwrap();

    for path in ["sku", "sku.suffix", "photo", "photo.url", "manual"] {
        let err = handle
            .to_partial_data(&FieldValues::from([(path.to_string(), json!("x"))]))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Usage, "path {path}");
    }

    let err = handle
        .to_partial_data(&values(json!({ "colour": "red" })))
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Usage);
}

#[test]
fn custom_separator_changes_path_handling() {
    let registry = SchemaRegistry::with_config(MapperConfig::new().path_separator('/'));
    let handle = registry.handle::<Product>().unwrap();
    let data = handle
        .to_partial_data(&values(json!({ "name/locale": "en" })))
        .unwrap();
    assert_eq!(data.get("displayName/locale"), Some(&json!("en")));

    let dotted = registry.handle::<DottedRename>().unwrap();
    assert_eq!(dotted.property_name("title"), Some("meta.title"));
}

#[test]
fn key_string_round_trip() {
    let registry = SchemaRegistry::new();

    let counters = registry.handle::<Counter>().unwrap();
    let mut counter = Counter::default();
    counters.set_key_from_str(&mut counter, "77").unwrap();
    assert_eq!(counter.id, 77);
    assert_eq!(counters.key_to_string(&counter).unwrap().as_deref(), Some("77"));

    let tickets = registry.handle::<Ticket>().unwrap();
    let mut ticket = Ticket::default();
    tickets.set_key_from_str(&mut ticket, "OPS-12").unwrap();
    assert_eq!(
        ticket.code,
        TicketCode {
            prefix: "OPS".to_string(),
            number: 12
        }
    );
    let err = tickets.set_key_from_str(&mut ticket, "OPS").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Conversion);

    let users = registry.handle::<TypeName>().unwrap();
    let user = TypeName::default();
    assert_eq!(users.key_to_string(&user).unwrap(), None);
}

#[test]
fn generic_field_access_by_name() {
    let registry = SchemaRegistry::new();
    let handle = registry.handle::<Product>().unwrap();
    let mut product = lamp();

    assert_eq!(
        handle.get_field(&product, "price").unwrap(),
        json!({ "cents": 1999 })
    );
    handle
        .set_field(&mut product, "name", json!("Wall lamp"))
        .unwrap();
    assert_eq!(product.name, "Wall lamp");

    let err = handle.get_field(&product, "views").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Usage);
}

fn build_error<E: Document>() -> docmap::MapperError {
    SchemaRegistry::new().handle::<E>().unwrap_err()
}

#[test]
fn key_marker_violations_are_configuration_errors() {
    let err = build_error::<NoKey>();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("no key field"));

    let err = build_error::<TwoKeys>();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("more than one key"));

    let err = build_error::<ConvertedKey>();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("key field cannot be converted"));

    let err = build_error::<FileKey>();
    assert!(err.to_string().contains("key field cannot be a file field"));

    let err = build_error::<NumericAutoKey>();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("auto-generated key must be a String"));
}

#[test]
fn file_and_web_marker_violations_are_configuration_errors() {
    let err = build_error::<NumericFile>();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("file field must be a String"));

    let err = build_error::<ConvertedFile>();
    assert!(err.to_string().contains("file field cannot be converted"));

    let err = build_error::<WebWithoutFile>();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("only allowed on file fields"));
}

#[test]
fn rename_and_converter_violations_are_configuration_errors() {
    let err = build_error::<MismatchedConverter>();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("MoneyConverter"));

    let err = build_error::<BlankRename>();
    assert!(err.to_string().contains("must not be blank"));

    let err = build_error::<DottedRename>();
    assert!(err.to_string().contains("must not contain '.'"));

    let err = build_error::<BlankCollection>();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("Collection name"));
}

#[test]
fn key_type_without_value_of_is_reflection_error() {
    let err = build_error::<Paint>();
    assert_eq!(err.category(), ErrorCategory::Reflection);
    assert!(err.to_string().contains("valueOf"));
    assert!(err.is_fatal());
}
