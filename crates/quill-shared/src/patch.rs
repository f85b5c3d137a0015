//! Tri-state field for partial updates of nullable values.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A change to a nullable field.
///
/// When used with `#[serde(default)]`, a missing JSON key deserializes to
/// [`Patch::Keep`], an explicit `null` to [`Patch::Clear`] and any other value
/// to [`Patch::Set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// Apply the change to `target`.
    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Clear => *target = None,
            Patch::Set(value) => *target = Some(value),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Patch::Set(v),
            None => Patch::Clear,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T> Serialize for Patch<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Patch::Set(value) => serializer.serialize_some(value),
            Patch::Keep | Patch::Clear => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        summary: Patch<String>,
    }

    #[test]
    fn test_missing_key_keeps() {
        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(body.summary, Patch::Keep);
    }

    #[test]
    fn test_null_clears() {
        let body: Body = serde_json::from_str(r#"{"summary": null}"#).unwrap();
        assert_eq!(body.summary, Patch::Clear);
    }

    #[test]
    fn test_value_sets() {
        let body: Body = serde_json::from_str(r#"{"summary": "short"}"#).unwrap();
        assert_eq!(body.summary, Patch::Set("short".to_string()));
    }

    #[test]
    fn test_apply_to() {
        let mut field = Some("old".to_string());
        Patch::Keep.apply_to(&mut field);
        assert_eq!(field.as_deref(), Some("old"));

        Patch::Set("new".to_string()).apply_to(&mut field);
        assert_eq!(field.as_deref(), Some("new"));

        Patch::Clear.apply_to(&mut field);
        assert_eq!(field, None);
    }
}
