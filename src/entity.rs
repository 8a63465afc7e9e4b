//! Generic entity wrapping contract.
//!
//! Every Podio resource is kept as the JSON object the API returned plus a
//! handle to the [`Session`] that fetched it. Fields are read by key; typed
//! accessors on each entity cover the fields this crate knows about, and
//! anything the API adds later stays reachable through [`Entity::field`].

use chrono::NaiveDateTime;
use serde_json::{Map, Value};

use crate::error::{PodioError, Result};
use crate::session::Session;

/// Ordered string-keyed mapping of JSON values backing an entity.
pub type Record = Map<String, Value>;

/// Podio's timestamp format (`2024-03-01 14:22:05`, UTC).
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A JSON object fetched from Podio, bound to a session.
pub trait Entity: Sized {
    /// Human-readable entity name used in error messages.
    const KIND: &'static str;

    /// Wrap a record. Fails if the record lacks the entity's identifier.
    fn from_record(session: Session, data: Record) -> Result<Self>;

    /// The session used for further calls.
    fn session(&self) -> &Session;

    /// The fields as last known.
    fn data(&self) -> &Record;

    /// Consume the entity, returning its fields.
    fn into_record(self) -> Record;

    /// Read a field. Unknown keys are `None`.
    fn field(&self, key: &str) -> Option<&Value> {
        self.data().get(key)
    }

    /// Read a string field.
    fn field_str(&self, key: &str) -> Option<&str> {
        self.field(key).and_then(Value::as_str)
    }

    /// Read an unsigned integer field.
    fn field_u64(&self, key: &str) -> Option<u64> {
        self.field(key).and_then(Value::as_u64)
    }

    /// Read a boolean field.
    fn field_bool(&self, key: &str) -> Option<bool> {
        self.field(key).and_then(Value::as_bool)
    }

    /// Read a Podio timestamp field.
    fn field_timestamp(&self, key: &str) -> Option<NaiveDateTime> {
        self.field_str(key).and_then(parse_timestamp)
    }

    /// Wrap a JSON value that must be an object.
    fn from_value(session: &Session, value: Value) -> Result<Self> {
        match value {
            Value::Object(data) => Self::from_record(session.clone(), data),
            other => Err(PodioError::UnexpectedResponse(format!(
                "expected {} object, got {}",
                Self::KIND,
                type_name(&other)
            ))),
        }
    }

    /// Wrap a JSON value that must be an array of objects.
    fn from_values(session: &Session, value: Value) -> Result<Vec<Self>> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| Self::from_value(session, item))
                .collect(),
            other => Err(PodioError::UnexpectedResponse(format!(
                "expected list of {}, got {}",
                Self::KIND,
                type_name(&other)
            ))),
        }
    }
}

/// Read the numeric identifier `field` from `data`.
pub(crate) fn require_id(data: &Record, entity: &'static str, field: &'static str) -> Result<u64> {
    data.get(field)
        .and_then(Value::as_u64)
        .ok_or(PodioError::MissingField { entity, field })
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Identifier of a space; accepts a raw id or a [`crate::Space`].
    SpaceId
);
id_type!(
    /// Identifier of an app; accepts a raw id or an [`crate::App`].
    AppId
);
id_type!(
    /// Identifier of a user; accepts a raw id or a [`crate::Member`].
    UserId
);

/// Kind of object a widget or flow hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefType {
    Space,
    App,
    Org,
    User,
}

impl RefType {
    /// The path segment Podio uses for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::App => "app",
            Self::Org => "org",
            Self::User => "user",
        }
    }

    /// Parse Podio's path segment.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "space" => Some(Self::Space),
            "app" => Some(Self::App),
            "org" => Some(Self::Org),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for RefType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed reference to a Podio object, e.g. `space/42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub ref_type: RefType,
    pub ref_id: u64,
}

impl Reference {
    pub fn new(ref_type: RefType, ref_id: u64) -> Self {
        Self { ref_type, ref_id }
    }

    /// Read a `{"type": "space", "id": 42}` object.
    pub(crate) fn from_json(value: &Value) -> Option<Self> {
        let ref_type = value.get("type").and_then(Value::as_str).and_then(RefType::parse)?;
        let ref_id = value.get("id").and_then(Value::as_u64)?;
        Some(Self { ref_type, ref_id })
    }

    pub(crate) fn to_json(self) -> Value {
        serde_json::json!({"type": self.ref_type.as_str(), "id": self.ref_id})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Credentials;
    use serde_json::json;

    struct Thing {
        session: Session,
        id: u64,
        data: Record,
    }

    impl Entity for Thing {
        const KIND: &'static str = "Thing";

        fn from_record(session: Session, data: Record) -> Result<Self> {
            let id = require_id(&data, Self::KIND, "thing_id")?;
            Ok(Self { session, id, data })
        }

        fn session(&self) -> &Session {
            &self.session
        }

        fn data(&self) -> &Record {
            &self.data
        }

        fn into_record(self) -> Record {
            self.data
        }
    }

    fn session() -> Session {
        Session::new(Credentials::new("id", "secret")).unwrap()
    }

    #[test]
    fn test_field_access_by_key() {
        let thing = Thing::from_value(
            &session(),
            json!({"thing_id": 5, "name": "Eng", "archived": false, "created_on": "2024-03-01 14:22:05"}),
        )
        .unwrap();

        assert_eq!(thing.id, 5);
        assert_eq!(thing.field_str("name"), Some("Eng"));
        assert_eq!(thing.field_bool("archived"), Some(false));
        assert_eq!(thing.field("nonexistent"), None);
        assert_eq!(
            thing.field_timestamp("created_on").unwrap().to_string(),
            "2024-03-01 14:22:05"
        );
    }

    #[test]
    fn test_record_keeps_key_order() {
        let thing =
            Thing::from_value(&session(), json!({"zeta": 1, "thing_id": 2, "alpha": 3})).unwrap();
        let keys: Vec<&str> = thing.data().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "thing_id", "alpha"]);
    }

    #[test]
    fn test_missing_identifier() {
        let err = Thing::from_value(&session(), json!({"name": "x"})).err().unwrap();
        assert!(matches!(
            err,
            PodioError::MissingField {
                entity: "Thing",
                field: "thing_id"
            }
        ));
    }

    #[test]
    fn test_non_object_values_are_rejected() {
        let err = Thing::from_value(&session(), json!([1, 2])).err().unwrap();
        assert!(matches!(err, PodioError::UnexpectedResponse(_)));

        let err = Thing::from_values(&session(), json!({"thing_id": 1})).err().unwrap();
        assert!(matches!(err, PodioError::UnexpectedResponse(_)));

        let things =
            Thing::from_values(&session(), json!([{"thing_id": 1}, {"thing_id": 2}])).unwrap();
        assert_eq!(things.len(), 2);
    }

    #[test]
    fn test_id_conversions() {
        let id: SpaceId = 42u64.into();
        assert_eq!(id, SpaceId(42));
        assert_eq!(id.to_string(), "42");
        assert_eq!(serde_json::to_value(UserId(7)).unwrap(), json!(7));
    }

    #[test]
    fn test_reference_json() {
        let reference = Reference::new(RefType::Space, 42);
        assert_eq!(reference.to_json(), json!({"type": "space", "id": 42}));
        assert_eq!(Reference::from_json(&reference.to_json()), Some(reference));
        assert_eq!(Reference::from_json(&json!({"type": "planet", "id": 1})), None);
    }
}
