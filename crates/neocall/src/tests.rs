//! Unit tests for invocation construction, resolution and identity.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use crate::keys;
use crate::registry::GENERIC_SERVICE;
use crate::request::malformed_path;
use crate::*;

// ============================================================================
//  FIXTURES
// ============================================================================

/// Registry with a payment service:
/// - `charge(i64, string)`
/// - `refund(i64)`
/// - `quote(i64)` and `quote(string)` (overloaded)
/// - `ping()`
/// - private `audit()`
fn registry() -> TypeRegistry {
    let registry = TypeRegistry::new();
    let i64_ty = registry.resolve("i64").unwrap();
    let string_ty = registry.resolve("string").unwrap();

    registry.register(
        TypeDescriptor::service("com.acme.Pay")
            .with_method(MethodDescriptor::public("charge", vec![i64_ty.clone(), string_ty.clone()]).returns("bool"))
            .with_method(MethodDescriptor::public("refund", vec![i64_ty.clone()]))
            .with_method(MethodDescriptor::public("quote", vec![i64_ty.clone()]))
            .with_method(MethodDescriptor::public("quote", vec![string_ty]))
            .with_method(MethodDescriptor::public("ping", vec![]))
            .with_method(MethodDescriptor::private("audit", vec![])),
    );
    registry
}

fn build(path: &str, headers: &Headers) -> Result<Invocation> {
    Invocation::build(path, headers, &registry(), malformed_path(path))
}

fn charge(registry: &TypeRegistry, amount: i64, memo: &str) -> Invocation {
    let service = registry.resolve("com.acme.Pay").unwrap();
    let method = service.public_method("charge").unwrap();
    Invocation::new(&service, Some("v1"), &method, vec![amount.into(), memo.into()]).unwrap()
}

fn hash_of(invocation: &Invocation) -> u64 {
    let mut hasher = DefaultHasher::new();
    invocation.hash(&mut hasher);
    hasher.finish()
}

// ============================================================================
//  PARSE FROM REQUEST
// ============================================================================

#[test]
fn test_three_segment_path() {
    let inv = build("com.acme.Pay/v1/charge", &Headers::new()).unwrap();

    assert_eq!(inv.target_type_name(), "com.acme.Pay");
    assert_eq!(inv.alias(), "v1");
    assert_eq!(inv.method_name(), "charge");
    assert_eq!(inv.arg_type_names(), ["i64", "string"]);
    assert!(inv.resolved_type().is_some());
    assert_eq!(inv.resolved_method().map(|m| m.name()), Some("charge"));
}

#[test]
fn test_three_segment_path_ignores_alias_header_and_extra_segments() {
    let headers = Headers::new().with("alias", "v9");
    let inv = build("/com.acme.Pay/v1/charge/extra/", &headers).unwrap();

    assert_eq!(inv.alias(), "v1");
    assert_eq!(inv.method_name(), "charge");
}

#[test]
fn test_two_segment_path_takes_alias_from_header() {
    let headers = Headers::new().with("alias", "v2");
    let inv = build("com.acme.Pay/charge", &headers).unwrap();

    assert_eq!(inv.target_type_name(), "com.acme.Pay");
    assert_eq!(inv.alias(), "v2");
    assert_eq!(inv.method_name(), "charge");
}

#[test]
fn test_two_segment_path_without_alias_is_malformed() {
    let err = build("com.acme.Pay/charge", &Headers::new()).unwrap_err();
    match err {
        Error::MalformedRequest(_) => {}
        _ => panic!("Expected MalformedRequest, got {:?}", err),
    }
}

#[test]
fn test_two_segment_path_with_empty_alias_is_malformed() {
    let headers = Headers::new().with("alias", "");
    let err = build("com.acme.Pay/charge", &headers).unwrap_err();
    assert!(matches!(err, Error::MalformedRequest(_)));
}

#[test]
fn test_alias_header_is_case_sensitive() {
    let headers = Headers::new().with("Alias", "v2");
    let err = build("com.acme.Pay/charge", &headers).unwrap_err();
    assert!(matches!(err, Error::MalformedRequest(_)));
}

#[test]
fn test_short_paths_are_malformed() {
    for path in ["", "/", "com.acme.Pay", "//com.acme.Pay//"] {
        let err = build(path, &Headers::new().with("alias", "v1")).unwrap_err();
        assert!(matches!(err, Error::MalformedRequest(_)), "path {:?} gave {:?}", path, err);
    }
}

#[test]
fn test_malformed_error_comes_from_caller_factory() {
    let err = Invocation::build("only", &Headers::new(), &registry(), || {
        Error::MalformedRequest("custom".into())
    })
    .unwrap_err();
    assert_eq!(err, Error::MalformedRequest("custom".into()));
}

#[test]
fn test_unknown_type() {
    let err = build("com.acme.Missing/v1/charge", &Headers::new()).unwrap_err();
    assert_eq!(err, Error::TargetTypeNotFound("com.acme.Missing".into()));
}

#[test]
fn test_unknown_method() {
    let err = build("com.acme.Pay/v1/teleport", &Headers::new()).unwrap_err();
    match err {
        Error::MethodNotFound { type_name, method } => {
            assert_eq!(type_name, "com.acme.Pay");
            assert_eq!(method, "teleport");
        }
        _ => panic!("Expected MethodNotFound, got {:?}", err),
    }
}

#[test]
fn test_private_method_is_not_found() {
    let err = build("com.acme.Pay/v1/audit", &Headers::new()).unwrap_err();
    assert!(matches!(err, Error::MethodNotFound { .. }));
}

/// Overloads cannot be served through the path entry point: resolution is by
/// name only and never consults argument types.
#[test]
fn test_overloaded_method_is_ambiguous_by_name() {
    let err = build("com.acme.Pay/v1/quote", &Headers::new()).unwrap_err();
    match err {
        Error::MethodOverloadAmbiguous { method, count, .. } => {
            assert_eq!(method, "quote");
            assert_eq!(count, 2);
        }
        _ => panic!("Expected MethodOverloadAmbiguous, got {:?}", err),
    }
}

#[test]
fn test_well_known_headers_copied_to_reserved_keys() {
    let headers = Headers::new()
        .with("token", "s3cr3t")
        .with("appId", 42)
        .with("appName", "billing")
        .with("appInsId", "billing-7");
    let inv = build("com.acme.Pay/v1/charge", &headers).unwrap();

    assert_eq!(inv.attachment(keys::HIDDEN_KEY_TOKEN), Some(&Value::from("s3cr3t")));
    assert_eq!(inv.attachment(keys::HIDDEN_KEY_APPID), Some(&Value::from("42")));
    assert_eq!(inv.attachment(keys::HIDDEN_KEY_APPNAME), Some(&Value::from("billing")));
    assert_eq!(inv.attachment(keys::HIDDEN_KEY_APPINSID), Some(&Value::from("billing-7")));
    assert!(inv.attachment("token").is_none());
}

#[test]
fn test_no_headers_means_no_attachments() {
    let inv = build("com.acme.Pay/v1/charge", &Headers::new()).unwrap();
    assert!(inv.attachments().is_none());
}

#[test]
fn test_hidden_headers_pass_through() {
    let headers = Headers::new()
        .with("_trace-id", "abc")
        .with("other", "x");
    let inv = build("com.acme.Pay/v1/charge", &headers).unwrap();

    assert_eq!(inv.attachment("_trace-id"), Some(&Value::from("abc")));
    assert!(inv.attachment("other").is_none());
    assert_eq!(inv.attachments().map(|m| m.len()), Some(1));
}

#[test]
fn test_hidden_header_values_are_verbatim() {
    let headers = Headers::new().with("_weights", vec![Value::Int(1), Value::Int(2)]);
    let inv = build("com.acme.Pay/v1/charge", &headers).unwrap();
    assert_eq!(inv.attachment("_weights"), Some(&Value::List(vec![Value::Int(1), Value::Int(2)])));
}

#[test]
fn test_byte_header_keys() {
    let mut headers = Headers::new();
    headers.insert(b"_span".as_slice(), "s-1");
    headers.insert(b"alias".to_vec(), "v3");
    let inv = build("com.acme.Pay/refund", &headers).unwrap();

    assert_eq!(inv.alias(), "v3");
    assert_eq!(inv.attachment("_span"), Some(&Value::from("s-1")));
}

// ============================================================================
//  DIRECT CONSTRUCTION AND ARGUMENT METADATA
// ============================================================================

#[test]
fn test_direct_construction_round_trip() {
    let registry = registry();
    let service = registry.resolve("com.acme.Pay").unwrap();
    let method = service.public_method("charge").unwrap();

    let inv = Invocation::new(&service, None, &method, vec![100.into(), "coffee".into()]).unwrap();

    assert_eq!(inv.arg_type_names(), method.param_names().as_slice());
    assert_eq!(inv.alias(), "");
    assert_eq!(inv.args(), [Value::Int(100), Value::from("coffee")]);
    let names: Vec<&str> = inv.arg_types(&registry).unwrap().iter().map(|t| t.name()).collect();
    assert_eq!(names, ["i64", "string"]);
}

#[test]
fn test_direct_construction_rejects_misaligned_args() {
    let registry = registry();
    let service = registry.resolve("com.acme.Pay").unwrap();
    let method = service.public_method("charge").unwrap();

    let err = Invocation::new(&service, Some("v1"), &method, vec![1.into()]).unwrap_err();
    assert_eq!(err, Error::ArgumentCountMismatch { expected: 2, found: 1 });
}

#[test]
fn test_setters_keep_arguments_aligned() {
    let registry = registry();
    let mut inv = charge(&registry, 5, "tea");

    assert!(inv.set_args(vec![1.into()]).is_err());
    assert!(inv.set_arg_type_names(vec!["i64".into()]).is_err());
    assert_eq!(inv.args().len(), 2);
    assert_eq!(inv.arg_type_names().len(), 2);
}

#[test]
fn test_zero_parameter_method_rejects_arguments() {
    let registry = registry();
    let service = registry.resolve("com.acme.Pay").unwrap();
    let method = service.public_method("ping").unwrap();

    let err = Invocation::new(&service, None, &method, vec![1.into(), 2.into()]).unwrap_err();
    assert_eq!(err, Error::ArgumentCountMismatch { expected: 0, found: 2 });

    let mut inv = Invocation::new(&service, None, &method, vec![]).unwrap();
    match inv.set_args(vec![1.into(), 2.into(), 3.into()]) {
        Err(Error::ArgumentCountMismatch { expected: 0, found: 3 }) => {}
        other => panic!("Expected ArgumentCountMismatch, got {other:?}"),
    }
    assert!(inv.args().is_empty());
}

#[test]
fn test_built_zero_parameter_call_rejects_arguments() {
    let mut inv = build("com.acme.Pay/v1/ping", &Headers::new()).unwrap();
    assert!(inv.arg_type_names().is_empty());
    assert!(inv.set_args(vec![1.into()]).is_err());
    inv.set_args(vec![]).unwrap();
}

#[test]
fn test_empty_arg_types_are_checked_once_assigned() {
    let mut inv = Invocation::named("com.acme.Pay", "v1", "ping");
    inv.set_arg_type_names(vec![]).unwrap();
    assert!(inv.set_args(vec![1.into(), 2.into(), 3.into()]).is_err());

    let mut inv = Invocation::named("com.acme.Pay", "v1", "ping");
    inv.set_args(vec![]).unwrap();
    assert!(inv.set_arg_type_names(vec!["i64".into()]).is_err());

    // Name-only descriptors leave the other side open until assigned.
    let mut inv = Invocation::named("com.acme.Pay", "v1", "refund");
    inv.set_args(vec![1.into()]).unwrap();
    inv.set_arg_type_names(vec!["i64".into()]).unwrap();
}

#[test]
fn test_arg_types_resolved_by_name_without_method() {
    let registry = registry();
    let mut inv = Invocation::named("com.acme.Pay", "v1", "refund");
    inv.set_arg_type_names(vec!["i64".into()]).unwrap();

    let types = inv.arg_types(&registry).unwrap();
    assert_eq!(types.len(), 1);
    assert_eq!(types[0].name(), "i64");
}

#[test]
fn test_arg_type_resolution_failure_is_not_cached() {
    let registry = registry();
    let mut inv = Invocation::named("com.acme.Pay", "v1", "refund");
    inv.set_arg_type_names(vec!["com.acme.Money".into()]).unwrap();

    let err = inv.arg_types(&registry).unwrap_err();
    assert_eq!(err, Error::ArgumentTypeResolutionFailed("com.acme.Money".into()));

    registry.register(TypeDescriptor::record("com.acme.Money"));
    assert_eq!(inv.arg_types(&registry).unwrap()[0].name(), "com.acme.Money");
}

#[test]
fn test_reassigning_arg_type_names_drops_cache() {
    let registry = registry();
    let mut inv = Invocation::named("com.acme.Pay", "v1", "refund");
    inv.set_arg_type_names(vec!["i64".into()]).unwrap();
    assert_eq!(inv.arg_types(&registry).unwrap()[0].name(), "i64");

    inv.set_arg_type_names(vec!["string".into()]).unwrap();
    assert_eq!(inv.arg_types(&registry).unwrap()[0].name(), "string");
}

#[test]
fn test_compute_arg_type_names_from_method() {
    let registry = registry();
    let service = registry.resolve("com.acme.Pay").unwrap();
    let method = service.public_method("refund").unwrap();

    let mut inv = Invocation::named("com.acme.Pay", "v1", "refund");
    assert!(inv.compute_arg_type_names().is_empty());

    inv.set_resolved_method(method);
    assert_eq!(inv.compute_arg_type_names(), ["i64"]);
}

// ============================================================================
//  GENERIC DETECTION
// ============================================================================

#[test]
fn test_generic_marker_type() {
    let registry = registry();
    let inv = Invocation::build(
        &format!("{}/v1/$invoke", GENERIC_SERVICE),
        &Headers::new(),
        &registry,
        || Error::MalformedRequest("bad".into()),
    )
    .unwrap();
    assert!(inv.is_generic());
}

#[test]
fn test_generic_flag_attachment() {
    let mut inv = Invocation::named("com.acme.Pay", "v1", "charge");
    inv.add_attachment(keys::GENERIC_KEY, true);
    assert!(inv.is_generic());

    let mut not_flagged = Invocation::named("com.acme.Pay", "v1", "charge");
    not_flagged.add_attachment(keys::GENERIC_KEY, "true");
    assert!(!not_flagged.is_generic());
}

#[test]
fn test_unresolved_and_unflagged_is_not_generic() {
    let inv = Invocation::named("com.acme.Pay", "v1", "charge");
    assert!(!inv.is_generic());
    assert!(!inv.is_generic());
}

/// The flag is memoized: later attachment writes are not observed.
#[test]
fn test_generic_flag_is_memoized() {
    let mut inv = Invocation::named("com.acme.Pay", "v1", "charge");
    assert!(!inv.is_generic());

    inv.add_attachment(keys::GENERIC_KEY, true);
    assert!(!inv.is_generic());
}

// ============================================================================
//  EQUALITY AND HASHING
// ============================================================================

#[test]
fn test_equality_is_reflexive_and_symmetric() {
    let registry = registry();
    let a = charge(&registry, 10, "x");
    let b = charge(&registry, 10, "x");

    assert_eq!(a, a);
    assert_eq!(a, b);
    assert_eq!(b, a);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_equality_ignores_resolution_state() {
    let registry = registry();
    let resolved = charge(&registry, 10, "x");

    let mut bare = Invocation::named("com.acme.Pay", "v1", "charge");
    bare.set_arg_type_names(vec!["i64".into(), "string".into()]).unwrap();
    bare.set_args(vec![10.into(), "x".into()]).unwrap();

    assert_eq!(resolved, bare);
    assert_eq!(hash_of(&resolved), hash_of(&bare));
}

#[test]
fn test_each_field_breaks_equality() {
    let registry = registry();
    let base = charge(&registry, 10, "x");

    let mut other = base.clone();
    other.set_target_type_name("com.acme.Other");
    assert_ne!(base, other);

    let mut other = base.clone();
    other.set_alias("v2");
    assert_ne!(base, other);

    let mut other = base.clone();
    other.set_method_name("refund");
    assert_ne!(base, other);

    let mut other = base.clone();
    other.set_arg_type_names(vec!["string".into(), "i64".into()]).unwrap();
    assert_ne!(base, other);

    let mut other = base.clone();
    other.set_args(vec!["x".into(), 10.into()]).unwrap();
    assert_ne!(base, other);

    let mut other = base.clone();
    other.add_attachment("_trace-id", "abc");
    assert_ne!(base, other);
}

#[test]
fn test_attachment_key_sets_matter() {
    let mut a = Invocation::named("T", "a", "m");
    a.add_attachment("_x", 1);
    let mut b = Invocation::named("T", "a", "m");
    b.add_attachment("_y", 1);
    assert_ne!(a, b);

    b.remove_attachment("_y");
    b.add_attachment("_x", 1);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_absent_and_empty_attachments_are_equal() {
    let absent = Invocation::named("T", "a", "m");
    let mut emptied = Invocation::named("T", "a", "m");
    emptied.add_attachment("_k", "v");
    emptied.remove_attachment("_k");

    assert!(emptied.attachments().is_some());
    assert!(!emptied.has_attachments());
    assert_eq!(absent, emptied);
    assert_eq!(hash_of(&absent), hash_of(&emptied));
}

#[test]
fn test_nan_arguments_keep_equality_reflexive() {
    let mut inv = Invocation::named("T", "a", "m");
    inv.set_args(vec![Value::Float(f64::NAN)]).unwrap();
    let copy = inv.clone();
    assert_eq!(inv, copy);
    assert_eq!(hash_of(&inv), hash_of(&copy));
}

// ============================================================================
//  SESSION BACKFILL
// ============================================================================

#[test]
fn test_apply_fills_missing_identity() {
    let session = Session::new("com.acme.Pay", "v1").remote_app("7", "shop", "shop-1");
    let mut inv = Invocation::named("", "", "charge");
    inv.apply(Some(&session));

    assert_eq!(inv.target_type_name(), "com.acme.Pay");
    assert_eq!(inv.alias(), "v1");
    assert_eq!(inv.attachment(keys::HIDDEN_KEY_APPID), Some(&Value::from("7")));
    assert_eq!(inv.attachment(keys::HIDDEN_KEY_APPNAME), Some(&Value::from("shop")));
    assert_eq!(inv.attachment(keys::HIDDEN_KEY_APPINSID), Some(&Value::from("shop-1")));
}

#[test]
fn test_apply_keeps_present_values() {
    let session = Session::new("com.acme.Other", "v9").remote_app("7", "shop", "shop-1");
    let mut inv = Invocation::named("com.acme.Pay", "v1", "charge");
    inv.add_attachment(keys::HIDDEN_KEY_APPID, "caller");
    inv.apply(Some(&session));

    assert_eq!(inv.target_type_name(), "com.acme.Pay");
    assert_eq!(inv.alias(), "v1");
    assert_eq!(inv.attachment(keys::HIDDEN_KEY_APPID), Some(&Value::from("caller")));
    assert!(inv.attachment(keys::HIDDEN_KEY_APPNAME).is_none());
    assert!(inv.attachment(keys::HIDDEN_KEY_APPINSID).is_none());
}

#[test]
fn test_apply_app_name_alone_blocks_backfill() {
    let session = Session::new("com.acme.Pay", "v1").remote_app("7", "shop", "shop-1");
    let mut inv = Invocation::named("com.acme.Pay", "v1", "charge");
    inv.add_attachment(keys::HIDDEN_KEY_APPNAME, "caller");
    inv.apply(Some(&session));

    assert!(inv.attachment(keys::HIDDEN_KEY_APPID).is_none());
}

#[test]
fn test_apply_without_session_is_noop() {
    let mut inv = Invocation::named("", "", "charge");
    let before = inv.clone();
    inv.apply(None);
    assert_eq!(inv, before);
    assert!(inv.attachments().is_none());
}

#[test]
fn test_apply_skips_missing_remote_identity() {
    let session = Session::new("com.acme.Pay", "v1");
    let mut inv = Invocation::named("", "", "charge");
    inv.apply(Some(&session));
    assert!(inv.attachments().is_none());
}

// ============================================================================
//  ATTACHMENTS AND DISPATCH
// ============================================================================

#[test]
fn test_attachment_helpers() {
    let mut inv = Invocation::named("T", "a", "m");
    inv.add_attachment("_null", Value::Null);
    inv.add_optional_attachment::<&str>("_none", None);
    assert!(inv.attachments().is_none());

    inv.add_attachments([("_a", 1), ("_b", 2)]);
    assert_eq!(inv.attachment_or("_a", 0), Value::Int(1));
    assert_eq!(inv.attachment_or("_c", 0), Value::Int(0));

    assert_eq!(inv.attachment_or_insert_with("_c", || Value::Int(3)), Some(&Value::Int(3)));
    assert_eq!(inv.attachment_or_insert_with("_c", || Value::Int(4)), Some(&Value::Int(3)));
    assert_eq!(inv.remove_attachment("_a"), Some(Value::Int(1)));
    assert_eq!(inv.remove_attachment("_a"), None);
}

struct Cashier;

impl ServiceObject for Cashier {
    fn call(&self, method: &MethodDescriptor, args: &[Value]) -> anyhow::Result<Value> {
        match method.name() {
            "charge" => Ok(Value::Bool(args.first().and_then(Value::as_int).is_some_and(|v| v > 0))),
            other => anyhow::bail!("unsupported method {}", other),
        }
    }
}

#[test]
fn test_invoke_dispatches_resolved_method() {
    let registry = registry();
    let mut inv = charge(&registry, 10, "x");

    assert_eq!(inv.invoke(&Cashier).unwrap(), Value::Bool(true));
    assert!(inv.invoke_target().is_err());

    inv.set_target_object(Arc::new(Cashier));
    assert_eq!(inv.invoke_target().unwrap(), Value::Bool(true));
}

#[test]
fn test_invoke_requires_resolved_method() {
    let inv = Invocation::named("com.acme.Pay", "v1", "charge");
    let err = inv.invoke(&Cashier).unwrap_err();
    assert!(err.to_string().contains("not resolved"));
}

#[test]
fn test_display() {
    let registry = registry();
    let inv = charge(&registry, 10, "x");
    assert_eq!(inv.to_string(), "com.acme.Pay/v1/charge(i64, string)");
}

#[test]
fn test_attachment_or_insert_with_skips_null() {
    let mut inv = Invocation::named("T", "a", "m");
    assert_eq!(inv.attachment_or_insert_with("_n", || Value::Null), None);
    assert!(inv.attachments().is_none());

    inv.add_attachment("_a", 1);
    assert_eq!(inv.attachment_or_insert_with("_n", || Value::Null), None);
    assert!(inv.attachment("_n").is_none());
    assert_eq!(inv.attachment_or_insert_with("_a", || Value::Null), Some(&Value::Int(1)));
}
