//! # Configuration Patcher
//!
//! Turns a loader configuration source into the configuration the host
//! hands to its module loader.
//!
//! 1. Extract the object literal of the first `<identifier>.config( ... )` call
//!    outside comments and strings
//! 2. Parse it with the relaxed literal grammar
//! 3. Overwrite `baseUrl`, attach the host require hook, set `context`
//! 4. Split `deps` off as root dependencies, loaded after the framework is
//!    patched

use crate::algorithms::literal::{parse_literal, value_kind};
use crate::domain::entities::RootDependencies;
use crate::domain::errors::ConfigFormatError;
use crate::ports::outbound::HostRequire;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

lazy_static! {
    static ref CONFIG_CALL: Regex =
        Regex::new(r"[A-Za-z_$][\w$]*\s*\.\s*config\s*\(").expect("valid config call pattern");
}

/// Loader configuration after host augmentation.
#[derive(Clone)]
pub struct PatchedConfig {
    fields: Map<String, Value>,
    host_require: Option<Arc<dyn HostRequire>>,
}

impl PatchedConfig {
    /// All data fields, including `baseUrl` and `context`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn base_url(&self) -> Option<&str> {
        self.fields.get("baseUrl").and_then(Value::as_str)
    }

    pub fn context(&self) -> Option<&str> {
        self.fields.get("context").and_then(Value::as_str)
    }

    /// The loader-native `require` hook.
    pub fn host_require(&self) -> Option<&Arc<dyn HostRequire>> {
        self.host_require.as_ref()
    }

    /// Data fields as one JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl fmt::Debug for PatchedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchedConfig")
            .field("fields", &self.fields)
            .field("host_require", &self.host_require.is_some())
            .finish()
    }
}

/// Directory portion of `path`, up to and including the last separator.
pub fn base_url_for(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(index) => &path[..=index],
        None => "",
    }
}

/// Text between the outermost parentheses of the first config call.
///
/// Calls that appear inside comments or string literals are not calls.
pub fn extract_config_literal(source: &str) -> Result<&str, ConfigFormatError> {
    let bytes = source.as_bytes();
    let mut cursor = 0;

    let call = CONFIG_CALL
        .find_iter(source)
        .find(|call| in_code(bytes, &mut cursor, call.start()))
        .ok_or(ConfigFormatError::MissingConfigCall)?;

    let open = call.end() - 1;
    let close = matching_paren(source, open)?;
    Ok(source[open + 1..close].trim())
}

/// Whether `target` lies outside comments and string literals.
///
/// `cursor` scans forward from the previous call; targets must be passed in
/// increasing order.
fn in_code(bytes: &[u8], cursor: &mut usize, target: usize) -> bool {
    if target < *cursor {
        return false;
    }
    while *cursor < target {
        match skip_non_code(bytes, *cursor) {
            Some(next) if next > target => {
                *cursor = next;
                return false;
            }
            Some(next) => *cursor = next,
            None => *cursor += 1,
        }
    }
    true
}

/// End of the comment or string literal starting at `i`, if one does.
fn skip_non_code(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes[i] {
        quote @ (b'"' | b'\'' | b'`') => {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != quote {
                if bytes[j] == b'\\' {
                    j += 1;
                }
                j += 1;
            }
            Some((j + 1).min(bytes.len()))
        }
        b'/' if bytes.get(i + 1) == Some(&b'/') => {
            let mut j = i + 2;
            while j < bytes.len() && bytes[j] != b'\n' {
                j += 1;
            }
            Some(j)
        }
        b'/' if bytes.get(i + 1) == Some(&b'*') => {
            let mut j = i + 2;
            while j + 1 < bytes.len() && !(bytes[j] == b'*' && bytes[j + 1] == b'/') {
                j += 1;
            }
            Some((j + 2).min(bytes.len()))
        }
        _ => None,
    }
}

/// Byte offset of the parenthesis closing the one at `open`.
///
/// String literals and comments are skipped.
fn matching_paren(source: &str, open: usize) -> Result<usize, ConfigFormatError> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut i = open;

    while i < bytes.len() {
        if let Some(next) = skip_non_code(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    Err(ConfigFormatError::UnterminatedCall { offset: open })
}

fn take_dependencies(value: Value) -> Result<RootDependencies, ConfigFormatError> {
    let items = match value {
        Value::Null => return Ok(RootDependencies::default()),
        Value::String(module) => return Ok(RootDependencies::new(vec![module])),
        Value::Array(items) => items,
        other => {
            return Err(ConfigFormatError::InvalidDependencies(format!(
                "expected an array of module names, found {}",
                value_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::String(module) => Ok(module),
            other => Err(ConfigFormatError::InvalidDependencies(format!(
                "module names must be strings, found {}",
                value_kind(&other)
            ))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(RootDependencies::new)
}

/// Patch a loader configuration source for use by the host.
pub fn patch_config(
    source: &str,
    config_path: &str,
    context: Option<&str>,
    host_require: Option<Arc<dyn HostRequire>>,
) -> Result<(PatchedConfig, RootDependencies), ConfigFormatError> {
    let literal = extract_config_literal(source)?;

    let mut fields = match parse_literal(literal)? {
        Value::Object(fields) => fields,
        other => {
            return Err(ConfigFormatError::NotAnObject {
                found: value_kind(&other),
            })
        }
    };

    fields.insert(
        "baseUrl".to_string(),
        Value::String(base_url_for(config_path).to_string()),
    );
    if let Some(context) = context {
        fields.insert("context".to_string(), Value::String(context.to_string()));
    }

    let root_dependencies = match fields.remove("deps") {
        Some(deps) => take_dependencies(deps)?,
        None => RootDependencies::default(),
    };

    Ok((
        PatchedConfig {
            fields,
            host_require,
        },
        root_dependencies,
    ))
}
