use alloc::borrow::Cow;
use alloc::string::{String, ToString};
use core::fmt;

use vc_convert::Path;
use vc_convert::value::{ObjectMap, Value};

use crate::error::AgentError;

/// One management request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Reads `path` below the root `name`. A `*` in the name reads every
    /// matching root.
    Read { name: String, path: Path },
    /// Writes `value` at `path` below the root `name`.
    Write { name: String, path: Path, value: Value },
    /// Describes the shape at `path`, whose first segment names a root. The
    /// empty path describes every root.
    List { path: Path },
    Version,
}

fn text_member<'v>(map: &'v ObjectMap, key: &'static str) -> Result<&'v str, AgentError> {
    match map.get(key) {
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(AgentError::BadRequest(Cow::Owned(alloc::format!("`{key}` must be a string")))),
        None => Err(AgentError::BadRequest(Cow::Owned(alloc::format!("missing `{key}`")))),
    }
}

fn path_member(map: &ObjectMap) -> Result<Path, AgentError> {
    let path = map.get("path").unwrap_or(&Value::Null);
    Path::from_value(path).map_err(|err| AgentError::BadRequest(Cow::Owned(err.to_string())))
}

impl Request {
    /// Reads a request object: `type` (`read`, `write`, `list` or
    /// `version`), plus `name`, `path` and `value` as the type needs them.
    ///
    /// ```
    /// use vc_agent::Request;
    ///
    /// let raw = serde_json::from_str(r#"{"type": "read", "name": "pool", "path": "workers/0"}"#).unwrap();
    /// let request = Request::from_value(&raw).unwrap();
    /// assert_eq!(request.to_string(), "read pool workers/0");
    /// ```
    pub fn from_value(raw: &Value) -> Result<Self, AgentError> {
        let Value::Object(map) = raw else {
            return Err(AgentError::BadRequest(Cow::Borrowed("a request must be an object")));
        };
        let kind = text_member(map, "type")?;
        if kind.eq_ignore_ascii_case("read") {
            return Ok(Request::Read {
                name: String::from(text_member(map, "name")?),
                path: path_member(map)?,
            });
        }
        if kind.eq_ignore_ascii_case("write") {
            let Some(value) = map.get("value") else {
                return Err(AgentError::BadRequest(Cow::Borrowed("missing `value`")));
            };
            return Ok(Request::Write {
                name: String::from(text_member(map, "name")?),
                path: path_member(map)?,
                value: value.clone(),
            });
        }
        if kind.eq_ignore_ascii_case("list") {
            return Ok(Request::List {
                path: path_member(map)?,
            });
        }
        if kind.eq_ignore_ascii_case("version") {
            return Ok(Request::Version);
        }
        Err(AgentError::BadRequest(Cow::Owned(alloc::format!(
            "unknown request type `{kind}`"
        ))))
    }

    /// The request as an object, echoed back in responses.
    pub fn to_value(&self) -> Value {
        let mut map = ObjectMap::with_capacity(4);
        match self {
            Request::Read { name, path } => {
                map.insert("type", Value::from("read"));
                map.insert("name", Value::from(name.as_str()));
                map.insert("path", Value::String(path.to_string()));
            }
            Request::Write { name, path, value } => {
                map.insert("type", Value::from("write"));
                map.insert("name", Value::from(name.as_str()));
                map.insert("path", Value::String(path.to_string()));
                map.insert("value", value.clone());
            }
            Request::List { path } => {
                map.insert("type", Value::from("list"));
                map.insert("path", Value::String(path.to_string()));
            }
            Request::Version => {
                map.insert("type", Value::from("version"));
            }
        }
        Value::Object(map)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Read { name, path } => write!(f, "read {name} {path}"),
            Request::Write { name, path, .. } => write!(f, "write {name} {path}"),
            Request::List { path } => write!(f, "list {path}"),
            Request::Version => f.write_str("version"),
        }
    }
}

#[cfg(test)]
mod tests {
    use vc_convert::Path;
    use vc_convert::value::Value;

    use super::Request;
    use crate::error::AgentError;

    fn parse(json: &str) -> Result<Request, AgentError> {
        Request::from_value(&serde_json::from_str::<Value>(json).unwrap())
    }

    #[test]
    fn parses_each_type() {
        assert_eq!(
            parse(r#"{"type":"READ","name":"a","path":["x",null]}"#).unwrap(),
            Request::Read {
                name: "a".into(),
                path: "x/*".parse::<Path>().unwrap(),
            },
        );
        assert_eq!(
            parse(r#"{"type":"write","name":"a","path":"x","value":3}"#).unwrap(),
            Request::Write {
                name: "a".into(),
                path: "x".parse::<Path>().unwrap(),
                value: Value::from(3_u8),
            },
        );
        assert_eq!(parse(r#"{"type":"list"}"#).unwrap(), Request::List { path: Path::root() });
        assert_eq!(parse(r#"{"type":"version"}"#).unwrap(), Request::Version);
    }

    #[test]
    fn rejects_malformed_requests() {
        for json in [
            "[]",
            r#"{"name":"a"}"#,
            r#"{"type":"read"}"#,
            r#"{"type":"read","name":1}"#,
            r#"{"type":"write","name":"a"}"#,
            r#"{"type":"read","name":"a","path":true}"#,
            r#"{"type":"exec"}"#,
        ] {
            assert!(matches!(parse(json), Err(AgentError::BadRequest(_))), "{json}");
        }
    }

    #[test]
    fn echo_round_trips() {
        let request = parse(r#"{"type":"write","name":"a","path":"x/!/y","value":[1]}"#).unwrap();
        assert_eq!(Request::from_value(&request.to_value()).unwrap(), request);
    }
}
