//! Deep merge of structured documents.
//!
//! Objects merge key by key, recursively. Arrays concatenate with the
//! incoming elements first. Any other combination takes the incoming value.
//! Existing keys keep their position; new keys are appended.

/// A document type that can absorb another of the same type.
pub trait DeepMerge: Sized {
    /// Merge `incoming` into `self`.
    #[must_use]
    fn deep_merge(self, incoming: Self) -> Self;
}

impl DeepMerge for serde_json::Value {
    fn deep_merge(self, incoming: Self) -> Self {
        use serde_json::Value;
        match (self, incoming) {
            (Value::Object(mut base), Value::Object(over)) => {
                for (key, value) in over {
                    match base.get_mut(&key) {
                        Some(slot) => {
                            let existing = std::mem::replace(slot, Value::Null);
                            *slot = existing.deep_merge(value);
                        }
                        None => {
                            base.insert(key, value);
                        }
                    }
                }
                Value::Object(base)
            }
            (Value::Array(existing), Value::Array(mut items)) => {
                items.extend(existing);
                Value::Array(items)
            }
            (_, incoming) => incoming,
        }
    }
}

impl DeepMerge for serde_yaml::Value {
    fn deep_merge(self, incoming: Self) -> Self {
        use serde_yaml::Value;
        match (self, incoming) {
            (Value::Mapping(mut base), Value::Mapping(over)) => {
                for (key, value) in over {
                    match base.get_mut(&key) {
                        Some(slot) => {
                            let existing = std::mem::replace(slot, Value::Null);
                            *slot = existing.deep_merge(value);
                        }
                        None => {
                            base.insert(key, value);
                        }
                    }
                }
                Value::Mapping(base)
            }
            (Value::Sequence(existing), Value::Sequence(mut items)) => {
                items.extend(existing);
                Value::Sequence(items)
            }
            (_, incoming) => incoming,
        }
    }
}
