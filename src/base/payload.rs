use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A JSON object keyed by field name.
pub type Record = Map<String, Value>;

/// Normalized response body: a single object or a list of objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Object(Record),
    List(Vec<Record>),
}

impl Payload {
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(record) => Ok(Payload::Object(record)),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(Error::UnexpectedPayload(format!(
                        "expected a list of objects, found element {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Payload::List),
            other => Err(Error::UnexpectedPayload(format!(
                "expected an object or a list, found {other}"
            ))),
        }
    }

    pub fn into_object(self) -> Result<Record> {
        match self {
            Payload::Object(record) => Ok(record),
            Payload::List(_) => Err(Error::UnexpectedPayload(
                "expected an object, found a list".into(),
            )),
        }
    }

    pub fn into_list(self) -> Result<Vec<Record>> {
        match self {
            Payload::List(records) => Ok(records),
            Payload::Object(_) => Err(Error::UnexpectedPayload(
                "expected a list, found an object".into(),
            )),
        }
    }

    pub fn records_mut(&mut self) -> Box<dyn Iterator<Item = &mut Record> + '_> {
        match self {
            Payload::Object(record) => Box::new(std::iter::once(record)),
            Payload::List(records) => Box::new(records.iter_mut()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Payload::Object(record) => Value::Object(record),
            Payload::List(records) => {
                Value::Array(records.into_iter().map(Value::Object).collect())
            }
        }
    }
}
