use crate::core::{DataType, DbError, Result, Value};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Conversion between a Rust field type and a stored [`Value`].
///
/// `DATA_TYPE` and `NULLABLE` describe the column the field maps to.
pub trait PersistField: Sized {
    const DATA_TYPE: DataType;
    const NULLABLE: bool;

    fn to_value(&self) -> Value;
    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(expected: DataType, got: &Value) -> Result<T> {
    Err(DbError::TypeMismatch(format!(
        "expected {}, got {}",
        expected,
        got.type_name()
    )))
}

impl PersistField for String {
    const DATA_TYPE: DataType = DataType::Text;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => mismatch(Self::DATA_TYPE, &other),
        }
    }
}

impl PersistField for i64 {
    const DATA_TYPE: DataType = DataType::Integer;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            other => mismatch(Self::DATA_TYPE, &other),
        }
    }
}

impl PersistField for f64 {
    const DATA_TYPE: DataType = DataType::Float;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => mismatch(Self::DATA_TYPE, &other),
        }
    }
}

impl PersistField for bool {
    const DATA_TYPE: DataType = DataType::Boolean;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => mismatch(Self::DATA_TYPE, &other),
        }
    }
}

impl PersistField for DateTime<Utc> {
    const DATA_TYPE: DataType = DataType::Timestamp;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => mismatch(Self::DATA_TYPE, &other),
        }
    }
}

impl PersistField for Uuid {
    const DATA_TYPE: DataType = DataType::Uuid;
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(id) => Ok(id),
            other => mismatch(Self::DATA_TYPE, &other),
        }
    }
}

impl<T: PersistField> PersistField for Option<T> {
    const DATA_TYPE: DataType = T::DATA_TYPE;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
