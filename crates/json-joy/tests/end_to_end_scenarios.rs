//! Scenario 8: RFC 7396 JSON Merge Patch interop. This workspace doesn't
//! implement patch *application* (that's an external collaborator's job);
//! this test hand-rolls merge-patch application using only the public
//! `Value` API to prove that API is sufficient for the job.

use json_joy::{parse, Value};

fn apply_merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_fields) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::object();
    }
    for (key, value) in patch_fields.iter() {
        if value.is_null() {
            target.erase(key);
        } else if value.is_object() {
            apply_merge_patch(target.field_mut(key), value);
        } else {
            *target.field_mut(key) = value.clone();
        }
    }
}

#[test]
fn merge_patch_application_via_the_value_api() {
    let mut target = parse(r#"{"a":"b","c":{"d":"e","f":"g"}}"#).unwrap();
    let patch = parse(r#"{"a":"z","c":{"f":null}}"#).unwrap();
    apply_merge_patch(&mut target, &patch);
    assert_eq!(target, parse(r#"{"a":"z","c":{"d":"e"}}"#).unwrap());
}
