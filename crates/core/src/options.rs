use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Shallow-merges partial option tables over `defaults`.
///
/// Each override is a JSON object whose keys replace the matching top-level
/// fields; later overrides win and `null` values are ignored. Anything that is
/// not an object is skipped. The merged table is deserialized back into `T`.
pub fn merge_options<T>(defaults: &T, overrides: &[Value]) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(defaults)?;
    if let Value::Object(base) = &mut merged {
        for patch in overrides.iter().filter_map(Value::as_object) {
            for (key, value) in patch {
                if !value.is_null() {
                    base.insert(key.clone(), value.clone());
                }
            }
        }
    }
    serde_json::from_value(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        foo: String,
        bar: i64,
        baz: bool,
    }

    fn defaults() -> Sample {
        Sample {
            foo: "default".into(),
            bar: 42,
            baz: false,
        }
    }

    #[test]
    fn no_overrides_returns_defaults() {
        assert_eq!(merge_options(&defaults(), &[]).unwrap(), defaults());
    }

    #[test]
    fn complete_override_replaces_everything() {
        let merged = merge_options(&defaults(), &[json!({"foo": "override", "bar": 24, "baz": true})]).unwrap();
        assert_eq!(
            merged,
            Sample {
                foo: "override".into(),
                bar: 24,
                baz: true
            }
        );
    }

    #[test]
    fn partial_override_keeps_other_fields() {
        let merged = merge_options(&defaults(), &[json!({"bar": 100})]).unwrap();
        assert_eq!(
            merged,
            Sample {
                bar: 100,
                ..defaults()
            }
        );
    }

    #[test]
    fn later_overrides_win() {
        let complete = json!({"foo": "override", "bar": 24, "baz": true});
        let partial = json!({"bar": 100});

        let merged = merge_options(&defaults(), &[complete.clone(), partial.clone()]).unwrap();
        assert_eq!((merged.foo.as_str(), merged.bar, merged.baz), ("override", 100, true));

        let merged = merge_options(&defaults(), &[partial, complete]).unwrap();
        assert_eq!(merged.bar, 24);
    }

    #[test]
    fn nulls_and_non_objects_are_ignored() {
        let merged = merge_options(&defaults(), &[json!({"foo": null, "baz": true}), json!(7)]).unwrap();
        assert_eq!(merged.foo, "default");
        assert!(merged.baz);
    }

    #[test]
    fn wrong_type_is_an_error() {
        assert!(merge_options(&defaults(), &[json!({"bar": "many"})]).is_err());
    }
}
