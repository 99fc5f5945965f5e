//! # Templates
//!
//! Parcel templates are rendered with [Tera](https://keats.github.io/tera/).
//! Each [`ParcelTemplate`] owns its own compiled engine, so rendering one
//! template only reads the shared context and produces a byte buffer.
//!
//! ## Context
//!
//! Templates see three read-only sections:
//!
//! - `values`: the merged values mapping
//! - `meta`: the parcel's `owner`, `name`, `version` and `source`
//! - `static`: `path`, the absolute path of the parcel's assets directory
//!
//! Mapping keys in values are turned into strings before rendering. Numbers
//! and booleans use their plain text, `~` becomes `null`, and sequence or
//! mapping keys become their JSON text.
//!
//! ## Function library
//!
//! [`FunctionLibrary::standard`] registers these filters on every template:
//!
//! | Filter | Example | Result |
//! |---|---|---|
//! | `to_json` | `{{ values.labels \| to_json }}` | JSON text, empty on failure |
//! | `replace_n` | `{{ "a-b-c" \| replace_n(from="-", to="_", n=1) }}` | `a_b-c` (`n < 0` replaces all) |
//! | `replace_all` | `{{ "a-b-c" \| replace_all(from="-", to="_") }}` | `a_b_c` |
//! | `quote` | `{{ values.name \| quote }}` | `"name"` |
//! | `b64encode` | `{{ "hi" \| b64encode }}` | `aGk=` |
//! | `b64decode` | `{{ "aGk=" \| b64decode }}` | `hi`, empty on failure |

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use serde_yaml::value::TaggedValue;
use serde_yaml::Value as YamlValue;
use tera::{Context, Tera, Value};

use crate::error::{Error, Result};
use crate::index::ParcelIdentity;
use crate::values::Values;

type FilterFn = fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>;

/// The fixed set of helper filters available inside templates.
///
/// Built once and handed to every template compilation.
pub struct FunctionLibrary {
    filters: Vec<(&'static str, FilterFn)>,
}

impl FunctionLibrary {
    pub fn standard() -> Self {
        let filters: Vec<(&'static str, FilterFn)> = vec![
            ("to_json", to_json_filter),
            ("replace_n", replace_n_filter),
            ("replace_all", replace_all_filter),
            ("quote", quote_filter),
            ("b64encode", b64encode_filter),
            ("b64decode", b64decode_filter),
        ];
        Self { filters }
    }

    /// Names of the registered filters.
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|(name, _)| *name).collect()
    }

    fn install(&self, tera: &mut Tera) {
        for (name, filter) in &self.filters {
            tera.register_filter(name, *filter);
        }
    }
}

impl Default for FunctionLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

/// Serialize any value to JSON, yielding an empty string on failure.
pub fn to_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Replace the first `n` occurrences of `from`; all of them when `n < 0`.
pub fn replace_n(input: &str, from: &str, to: &str, n: i64) -> String {
    if n < 0 {
        input.replace(from, to)
    } else {
        input.replacen(from, to, n as usize)
    }
}

pub fn quote(input: &str) -> String {
    format!("\"{}\"", input)
}

pub fn b64encode(input: &str) -> String {
    STANDARD.encode(input.as_bytes())
}

/// Decode standard base64, yielding an empty string on invalid input.
pub fn b64decode(input: &str) -> String {
    STANDARD
        .decode(input.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_default()
}

fn to_json_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(to_json(value)))
}

fn replace_n_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let input = input_string("replace_n", value)?;
    let from = string_arg("replace_n", args, "from")?;
    let to = string_arg("replace_n", args, "to")?;
    let n = match args.get("n") {
        Some(v) => v.as_i64().ok_or_else(|| {
            tera::Error::msg(format!(
                "Filter `replace_n` expected `n` to be an integer, got {}",
                v
            ))
        })?,
        None => return Err(tera::Error::msg("Filter `replace_n` requires an `n` argument")),
    };
    Ok(Value::String(replace_n(&input, &from, &to, n)))
}

fn replace_all_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let input = input_string("replace_all", value)?;
    let from = string_arg("replace_all", args, "from")?;
    let to = string_arg("replace_all", args, "to")?;
    Ok(Value::String(replace_n(&input, &from, &to, -1)))
}

fn quote_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(quote(&input_string("quote", value)?)))
}

fn b64encode_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(b64encode(&input_string("b64encode", value)?)))
}

fn b64decode_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(b64decode(&input_string("b64decode", value)?)))
}

/// Scalars are accepted as their text form; sequences and mappings are not.
fn input_string(filter: &str, value: &Value) -> tera::Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(tera::Error::msg(format!(
            "Filter `{}` expected a string, got {}",
            filter, other
        ))),
    }
}

fn string_arg(filter: &str, args: &HashMap<String, Value>, name: &str) -> tera::Result<String> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(tera::Error::msg(format!(
            "Filter `{}` expected `{}` to be a string, got {}",
            filter, name, other
        ))),
        None => Err(tera::Error::msg(format!(
            "Filter `{}` requires a `{}` argument",
            filter, name
        ))),
    }
}

#[derive(Serialize)]
struct MetaSection<'a> {
    owner: &'a str,
    name: &'a str,
    version: &'a str,
    source: &'a str,
}

#[derive(Serialize)]
struct StaticSection {
    path: String,
}

#[derive(Serialize)]
struct RenderDocument<'a> {
    values: Values,
    meta: MetaSection<'a>,
    #[serde(rename = "static")]
    assets: StaticSection,
}

/// Build the document every template of a parcel is rendered against.
pub fn build_context(
    values: &Values,
    identity: &ParcelIdentity,
    source: &str,
    static_path: &Path,
) -> Result<Context> {
    let document = RenderDocument {
        values: string_keyed(values),
        meta: MetaSection {
            owner: &identity.owner,
            name: &identity.name,
            version: &identity.version,
            source,
        },
        assets: StaticSection {
            path: static_path.display().to_string(),
        },
    };

    Context::from_serialize(&document).map_err(|e| Error::Serialization {
        message: describe(&e),
    })
}

/// Copy of `values` where every mapping key, at any depth, is a string.
fn string_keyed(values: &Values) -> Values {
    values
        .iter()
        .map(|(key, value)| (YamlValue::String(key_text(key)), string_keyed_value(value)))
        .collect()
}

fn string_keyed_value(value: &YamlValue) -> YamlValue {
    match value {
        YamlValue::Mapping(mapping) => YamlValue::Mapping(string_keyed(mapping)),
        YamlValue::Sequence(items) => {
            YamlValue::Sequence(items.iter().map(string_keyed_value).collect())
        }
        YamlValue::Tagged(tagged) => YamlValue::Tagged(Box::new(TaggedValue {
            tag: tagged.tag.clone(),
            value: string_keyed_value(&tagged.value),
        })),
        other => other.clone(),
    }
}

fn key_text(key: &YamlValue) -> String {
    match key {
        YamlValue::String(text) => text.clone(),
        YamlValue::Number(number) => number.to_string(),
        YamlValue::Bool(flag) => flag.to_string(),
        YamlValue::Null => "null".to_string(),
        YamlValue::Tagged(tagged) => key_text(&tagged.value),
        other => serde_json::to_string(&string_keyed_value(other)).unwrap_or_default(),
    }
}

/// One template file of a parcel together with its compiled form.
pub struct ParcelTemplate {
    path: PathBuf,
    name: String,
    engine: Tera,
}

impl ParcelTemplate {
    /// Read and compile the template at `path`, registered as `name`.
    pub fn compile(path: &Path, name: &str, library: &FunctionLibrary) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|e| Error::RenderFailed {
            template: name.to_string(),
            message: e.to_string(),
        })?;
        let mut template = Self::from_source(name, &source, library)?;
        template.path = path.to_path_buf();
        Ok(template)
    }

    /// Compile template text that does not come from a file.
    pub fn from_source(name: &str, source: &str, library: &FunctionLibrary) -> Result<Self> {
        let mut engine = Tera::default();
        engine.autoescape_on(vec![]);
        library.install(&mut engine);
        engine
            .add_raw_template(name, source)
            .map_err(|e| Error::RenderFailed {
                template: name.to_string(),
                message: describe(&e),
            })?;

        Ok(Self {
            path: PathBuf::from(name),
            name: name.to_string(),
            engine,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name relative to the template directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base file name used for the rendered output.
    pub fn output_name(&self) -> String {
        Path::new(&self.name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }

    /// Render against `context`.
    pub fn render(&self, context: &Context) -> Result<Vec<u8>> {
        self.engine
            .render(&self.name, context)
            .map(String::into_bytes)
            .map_err(|e| Error::RenderFailed {
                template: self.name.clone(),
                message: describe(&e),
            })
    }
}

impl std::fmt::Debug for ParcelTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParcelTemplate")
            .field("path", &self.path)
            .field("name", &self.name)
            .finish()
    }
}

/// Tera keeps the useful detail in the error's source chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}
