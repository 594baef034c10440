use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use log::{debug, warn};
use vc_convert::context::SerializeContext;
use vc_convert::fault::FaultAction;
use vc_convert::path::Segment;
use vc_convert::value::{ObjectMap, Value};
use vc_convert::{Converter, Path, SerializeConfig};
use vc_reflect::{Reflect, ReflectRef};

use crate::error::AgentError;
use crate::request::Request;
use crate::tree::ObjectTree;

// -----------------------------------------------------------------------------
// Agent

/// Answers [`Request`]s against an [`ObjectTree`].
///
/// Every answer is a response envelope: `status`, `timestamp` (epoch
/// seconds) and either `value`, or `error_type` and `error`. With
/// `include_request_echo` the request is echoed under `request`.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, RwLock};
/// use vc_agent::{Agent, ObjectTree, Request};
/// use vc_convert::value::Value;
///
/// let tree = Arc::new(ObjectTree::new());
/// tree.register("limits", Arc::new(RwLock::new(vec![10_u32, 20])));
/// let agent = Agent::new(tree);
///
/// let request = Request::Read { name: "limits".into(), path: "1".parse().unwrap() };
/// let response = agent.handle(&request);
/// assert_eq!(response.get("status"), Some(&Value::from(200_u16)));
/// assert_eq!(response.get("value"), Some(&Value::from(20_u32)));
/// ```
#[derive(Debug, Clone)]
pub struct Agent {
    tree: Arc<ObjectTree>,
    converter: Converter,
    config: SerializeConfig,
}

impl Agent {
    pub fn new(tree: Arc<ObjectTree>) -> Self {
        Self {
            tree,
            converter: Converter::new(),
            config: SerializeConfig::default(),
        }
    }

    #[inline]
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = converter;
        self
    }

    /// Sets the options used by requests that carry none.
    #[inline]
    pub fn with_config(mut self, config: SerializeConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn tree(&self) -> &Arc<ObjectTree> {
        &self.tree
    }

    #[inline]
    pub fn config(&self) -> &SerializeConfig {
        &self.config
    }

    /// Handles `request` with the agent's options.
    #[inline]
    pub fn handle(&self, request: &Request) -> Value {
        self.handle_with(request, &self.config)
    }

    /// Handles `request` with the given options.
    pub fn handle_with(&self, request: &Request, config: &SerializeConfig) -> Value {
        debug!("handling `{request}`");
        let result = self.dispatch(request, config);
        let echo = config.include_request_echo.then(|| request.to_value());
        envelope(result, echo)
    }

    /// Handles a raw request object. Processing options may be given under
    /// `config`, see [`SerializeConfig::from_options`].
    ///
    /// ```
    /// use std::sync::Arc;
    /// use vc_agent::{Agent, ObjectTree};
    /// use vc_convert::value::Value;
    ///
    /// let agent = Agent::new(Arc::new(ObjectTree::new()));
    /// let raw = serde_json::from_str(r#"{"type": "read", "name": "missing"}"#).unwrap();
    /// let response = agent.handle_value(&raw);
    /// assert_eq!(response.get("status"), Some(&Value::from(404_u16)));
    /// assert_eq!(response.get("error_type"), Some(&Value::from("UnknownObject")));
    /// ```
    pub fn handle_value(&self, raw: &Value) -> Value {
        let config = match raw.get("config") {
            Some(options) => match SerializeConfig::from_options(options) {
                Ok(config) => config,
                Err(err) => return envelope(Err(err.into()), None),
            },
            None => self.config.clone(),
        };
        match Request::from_value(raw) {
            Ok(request) => self.handle_with(&request, &config),
            Err(err) => {
                debug!("rejecting request: {err}");
                envelope(Err(err), config.include_request_echo.then(|| raw.clone()))
            }
        }
    }

    fn dispatch(&self, request: &Request, config: &SerializeConfig) -> Result<Value, AgentError> {
        match request {
            Request::Read { name, path } if name.contains('*') => self.read_matching(name, path, config),
            Request::Read { name, path } => {
                let root = self.root(name)?;
                Ok(self.converter.serialize(&*root, path, config)?)
            }
            Request::Write { name, path, value } => {
                let root = self.root(name)?;
                let old = self.converter.set_shared_value(&*root, path, value, config)?;
                match old {
                    Some(old) => Ok(self.converter.serialize(&*old, &Path::root(), config)?),
                    None => Ok(Value::Null),
                }
            }
            Request::List { path } => self.list(path, config),
            Request::Version => Ok(version()),
        }
    }

    fn root(&self, name: &str) -> Result<Arc<dyn Reflect>, AgentError> {
        self.tree
            .get(name)
            .ok_or_else(|| AgentError::UnknownObject(String::from(name)))
    }

    /// Reads `path` below every root matching `pattern`, keyed by root name.
    fn read_matching(&self, pattern: &str, path: &Path, config: &SerializeConfig) -> Result<Value, AgentError> {
        let handler = config.fault_handler();
        let mut out = ObjectMap::new();
        for (name, root) in self.tree.matching(pattern) {
            match self.converter.serialize(&*root, path, config) {
                Ok(value) => {
                    out.insert(name, value);
                }
                Err(err) => {
                    if let FaultAction::Substitute(value) = handler.handle(err)? {
                        out.insert(name, value);
                    }
                }
            }
        }
        Ok(Value::Object(out))
    }

    fn list(&self, path: &Path, config: &SerializeConfig) -> Result<Value, AgentError> {
        let Some((first, rest)) = path.segments().split_first() else {
            let mut out = ObjectMap::new();
            for (name, root) in self.tree.matching("*") {
                let shape = self
                    .converter
                    .inspect(&*root, &Path::root(), config, |value| self.describe(value, config))
                    .unwrap_or(Value::Null);
                out.insert(name, shape);
            }
            return Ok(Value::Object(out));
        };
        let Segment::Key(name) = first else {
            return Err(AgentError::BadRequest("list needs a root name".into()));
        };
        let root = self.root(name)?;
        let rest: Path = rest.iter().cloned().collect();
        Ok(self
            .converter
            .inspect(&*root, &rest, config, |value| self.describe(value, config))?)
    }

    /// The kind, type and members of `value`.
    ///
    /// Runs under [`Converter::inspect`], which opens shared targets; one
    /// that reaches this point is locked further up the path.
    fn describe(&self, value: &dyn Reflect, config: &SerializeConfig) -> Value {
        if let ReflectRef::Shared(_) = value.reflect_ref() {
            return Value::String(format!("[Reference {}]", value.type_path()));
        }

        let mut out = ObjectMap::with_capacity(3);
        out.insert("kind", Value::from(value.reflect_kind().as_str()));
        out.insert("type", Value::from(value.type_path()));
        let members: Option<Vec<String>> = match value.reflect_ref() {
            ReflectRef::Struct(s) => Some(s.iter_fields().map(|(info, _)| String::from(info.name())).collect()),
            ReflectRef::Enum(e) => {
                out.insert("variant", Value::from(e.variant_name()));
                Some(
                    e.iter_fields()
                        .enumerate()
                        .map(|(index, (name, _))| name.map_or_else(|| index.to_string(), String::from))
                        .collect(),
                )
            }
            ReflectRef::Map(map) => {
                let mut cx = SerializeContext::new(self.converter.registry(), config);
                Some(map.iter().filter_map(|(key, _)| cx.render_key(key).ok()).collect())
            }
            ReflectRef::List(list) => {
                out.insert("len", Value::from(list.len()));
                None
            }
            ReflectRef::Tuple(tuple) => {
                out.insert("len", Value::from(tuple.field_len()));
                None
            }
            ReflectRef::Set(set) => {
                out.insert("len", Value::from(set.len()));
                None
            }
            ReflectRef::Optional(optional) => {
                out.insert("present", Value::Bool(optional.get().is_some()));
                None
            }
            ReflectRef::Shared(_) | ReflectRef::Opaque(_) => None,
        };
        if let Some(members) = members {
            out.insert("members", members.into_iter().map(Value::String).collect());
        }
        Value::Object(out)
    }
}

// -----------------------------------------------------------------------------
// Envelope

fn timestamp() -> Value {
    Value::from(chrono::Utc::now().timestamp())
}

fn version() -> Value {
    let mut out = ObjectMap::with_capacity(2);
    out.insert("agent", Value::from(env!("CARGO_PKG_VERSION")));
    out.insert("protocol", Value::from("1"));
    Value::Object(out)
}

fn envelope(result: Result<Value, AgentError>, echo: Option<Value>) -> Value {
    let mut out = ObjectMap::with_capacity(5);
    match result {
        Ok(value) => {
            out.insert("status", Value::from(200_u16));
            out.insert("value", value);
        }
        Err(err) => {
            let status = err.status();
            if status >= 500 {
                warn!("request failed with {status}: {err}");
            }
            out.insert("status", Value::from(status));
            out.insert("error_type", Value::from(err.kind_name()));
            out.insert("error", Value::String(err.to_string()));
        }
    }
    out.insert("timestamp", timestamp());
    if let Some(echo) = echo {
        out.insert("request", echo);
    }
    Value::Object(out)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::collections::BTreeMap;
    use alloc::string::{String, ToString};
    use alloc::sync::{Arc, Weak};
    use alloc::vec;
    use alloc::vec::Vec;
    use std::sync::{Mutex, RwLock};

    use vc_convert::SerializeConfig;
    use vc_convert::fault::FaultMode;
    use vc_convert::value::Value;
    use vc_reflect::derive::Reflect;

    use super::Agent;
    use crate::request::Request;
    use crate::tree::ObjectTree;

    #[derive(Reflect, Debug)]
    struct Pool {
        name: String,
        size: u32,
        #[reflect(read_only)]
        created: u64,
        workers: Vec<String>,
    }

    fn agent() -> Agent {
        let tree = Arc::new(ObjectTree::new());
        tree.register(
            "pool.db",
            Arc::new(RwLock::new(Pool {
                name: String::from("db"),
                size: 4,
                created: 1,
                workers: vec![String::from("w0")],
            })),
        );
        tree.register(
            "pool.io",
            Arc::new(RwLock::new(Pool {
                name: String::from("io"),
                size: 2,
                created: 2,
                workers: Vec::new(),
            })),
        );
        tree.register("limits", Arc::new(BTreeMap::from([(String::from("max"), 9_u8)])));
        Agent::new(tree)
    }

    fn read(name: &str, path: &str) -> Request {
        Request::Read {
            name: name.into(),
            path: path.parse().unwrap(),
        }
    }

    fn status(response: &Value) -> u16 {
        response.get("status").and_then(Value::as_u64).unwrap() as u16
    }

    #[test]
    fn reads_one_root() {
        let response = agent().handle(&read("pool.db", "workers"));
        assert_eq!(status(&response), 200);
        assert_eq!(response.get("value").unwrap().to_string(), r#"["w0"]"#);
        assert!(response.get("timestamp").and_then(Value::as_i64).is_some());
        assert!(response.get("request").is_none());
    }

    #[test]
    fn wildcard_names_fan_out() {
        let agent = agent().with_config(SerializeConfig::default().with_fault_mode(FaultMode::Filtering));
        let response = agent.handle(&read("pool.*", "size"));
        assert_eq!(response.get("value").unwrap().to_string(), r#"{"pool.db":4,"pool.io":2}"#);

        let response = agent.handle(&read("*", "size"));
        assert_eq!(response.get("value").unwrap().to_string(), r#"{"pool.db":4,"pool.io":2}"#);

        let throwing = agent.handle_with(&read("*", "size"), &SerializeConfig::default());
        assert_eq!(status(&throwing), 404);
    }

    #[test]
    fn writes_return_the_old_value() {
        let agent = agent();
        let write = Request::Write {
            name: "pool.db".into(),
            path: "size".parse().unwrap(),
            value: Value::from(8_u32),
        };
        let response = agent.handle(&write);
        assert_eq!(status(&response), 200);
        assert_eq!(response.get("value"), Some(&Value::from(4_u32)));
        assert_eq!(agent.handle(&read("pool.db", "size")).get("value"), Some(&Value::from(8_u32)));

        let read_only = Request::Write {
            name: "pool.db".into(),
            path: "created".parse().unwrap(),
            value: Value::from(5_u64),
        };
        let response = agent.handle(&read_only);
        assert_eq!(status(&response), 403);
        assert_eq!(response.get("error_type"), Some(&Value::from("NotWritable")));

        let unlocked = Request::Write {
            name: "limits".into(),
            path: "max".parse().unwrap(),
            value: Value::from(1_u8),
        };
        assert_eq!(status(&agent.handle(&unlocked)), 403);
    }

    #[test]
    fn errors_map_to_statuses() {
        let agent = agent();
        assert_eq!(status(&agent.handle(&read("nope", ""))), 404);
        assert_eq!(status(&agent.handle(&read("pool.db", "missing"))), 404);
        assert_eq!(status(&agent.handle(&read("pool.db", "workers/7"))), 400);
        assert_eq!(status(&agent.handle(&read("pool.db", "size/0"))), 400);

        let response = agent.handle_value(&Value::from("read"));
        assert_eq!(status(&response), 400);
        assert_eq!(response.get("error_type"), Some(&Value::from("BadRequest")));
    }

    #[test]
    fn echo_and_options_from_raw_requests() {
        let raw: Value = serde_json::from_str(
            r#"{"type":"read","name":"pool.db","path":"workers","config":{"includeRequest":true,"maxCollectionSize":1}}"#,
        )
        .unwrap();
        let response = agent().handle_value(&raw);
        assert_eq!(status(&response), 200);
        let echo = response.get("request").unwrap();
        assert_eq!(echo.get("name"), Some(&Value::from("pool.db")));
    }

    #[test]
    fn lists_shapes() {
        let agent = agent();
        let response = agent.handle(&Request::List {
            path: "pool.db".parse().unwrap(),
        });
        let value = response.get("value").unwrap();
        assert_eq!(value.get("kind"), Some(&Value::from("Struct")));
        assert_eq!(value.get("members").unwrap().to_string(), r#"["name","size","created","workers"]"#);

        let response = agent.handle(&Request::List {
            path: "pool.db/workers".parse().unwrap(),
        });
        let value = response.get("value").unwrap();
        assert_eq!(value.get("kind"), Some(&Value::from("List")));
        assert_eq!(value.get("len"), Some(&Value::from(1_usize)));

        let all = agent.handle(&Request::List { path: "".parse().unwrap() });
        let names: Vec<&str> = all
            .get("value")
            .and_then(Value::as_object)
            .unwrap()
            .keys()
            .collect();
        assert_eq!(names, ["limits", "pool.db", "pool.io"]);
    }

    #[derive(Reflect, Debug)]
    struct Cell {
        name: String,
        parent: Weak<Mutex<Cell>>,
        kids: Vec<Arc<Mutex<Cell>>>,
    }

    #[test]
    fn listing_a_held_back_edge_returns_a_reference() {
        let root = Arc::new(Mutex::new(Cell {
            name: String::from("root"),
            parent: Weak::new(),
            kids: Vec::new(),
        }));
        let kid = Arc::new(Mutex::new(Cell {
            name: String::from("kid"),
            parent: Arc::downgrade(&root),
            kids: Vec::new(),
        }));
        root.lock().unwrap().kids.push(kid);

        let tree = Arc::new(ObjectTree::new());
        tree.register("root", root.clone());
        let agent = Agent::new(tree);
        let list = |path: &str| agent.handle(&Request::List { path: path.parse().unwrap() });

        let response = list("root/kids/0/parent");
        assert_eq!(status(&response), 200);
        let value = response.get("value").and_then(Value::as_str).unwrap();
        assert!(value.starts_with("[Reference "), "{value}");

        let kid = list("root/kids/0");
        assert_eq!(kid.get("value").and_then(|v| v.get("kind")), Some(&Value::from("Struct")));
        assert_eq!(status(&list("root/parent")), 404);

        let all = list("");
        let shape = all.get("value").and_then(|v| v.get("root")).unwrap();
        assert_eq!(shape.get("kind"), Some(&Value::from("Struct")));
    }

    #[test]
    fn version_reports_the_crate() {
        let response = agent().handle(&Request::Version);
        assert_eq!(
            response.get("value").and_then(|v| v.get("agent")),
            Some(&Value::from(env!("CARGO_PKG_VERSION")))
        );
    }
}
