//! Declarative mapping from the 42 API user document to a normalized profile.
//!
//! A [`FieldSpec`] maps dotted output paths (`"emails.0.value"`) to either a
//! dotted input path into the source document or a function computing the
//! value from the whole document. Digit-only segments address array
//! elements, so `"emails.0.value"` produces `{"emails": [{"value": ...}]}`.

use authkestra_core::path::{self, Segment};
use authkestra_core::AuthError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Function computing a profile value from the whole source document.
pub type Computation = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// How a single output field gets its value.
#[derive(Clone)]
pub enum FieldMapping {
    /// Copy the value found at this dotted path in the source document.
    Path(String),
    /// Store whatever the function returns.
    Computed(Computation),
}

impl fmt::Debug for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldMapping::Path(path) => f.debug_tuple("Path").field(path).finish(),
            FieldMapping::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

const DEFAULT_PATHS: &[(&str, &str)] = &[
    ("username", "login"),
    ("displayName", "displayname"),
    ("name.familyName", "last_name"),
    ("name.givenName", "first_name"),
    ("profileUrl", "url"),
    ("emails.0.value", "email"),
    ("phoneNumbers.0.value", "phone"),
    ("photos.0.value", "image_url"),
];

/// Largest array index an output path may address. Arrays are padded with
/// `null` up to the index, so the bound also caps their length.
pub const MAX_INDEX: usize = 1023;

/// Profile keys set by the provider itself, never by a field table.
pub const RESERVED_ROOTS: &[&str] = &["provider", "_raw", "_json"];

/// The `id` of the document as a string. The 42 API returns numeric ids.
pub fn stringify_id(document: &Value) -> Value {
    match document.get("id") {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(id)) => Value::String(id.clone()),
        Some(other) => Value::String(other.to_string()),
    }
}

/// Table of output paths and the mapping that fills each of them.
///
/// [`FieldSpec::default`] is the normalized profile shape used when no
/// table is configured. Use [`FieldSpec::empty`] to start a custom one.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    entries: BTreeMap<String, FieldMapping>,
}

impl Default for FieldSpec {
    fn default() -> Self {
        DEFAULT_PATHS
            .iter()
            .fold(Self::empty(), |spec, (output, input)| {
                spec.path(*output, *input)
            })
            .computed("id", stringify_id)
    }
}

impl FieldSpec {
    /// A table with no fields.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// A table of path mappings only.
    pub fn from_paths<I, K, V>(paths: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        paths
            .into_iter()
            .fold(Self::empty(), |spec, (output, input)| spec.path(output, input))
    }

    /// Fill `output` with the value at `input` in the source document.
    pub fn path(mut self, output: impl Into<String>, input: impl Into<String>) -> Self {
        self.entries
            .insert(output.into(), FieldMapping::Path(input.into()));
        self
    }

    /// Fill `output` with the result of `compute`.
    pub fn computed<F>(mut self, output: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.entries
            .insert(output.into(), FieldMapping::Computed(Arc::new(compute)));
        self
    }

    /// Iterate over the entries by output path.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldMapping)> {
        self.entries
            .iter()
            .map(|(output, mapping)| (output.as_str(), mapping))
    }

    /// Number of output fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table declares no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that the output paths describe a consistent tree.
    ///
    /// An output path may not also be the parent of another one, a parent
    /// may not be addressed both by index and by key, and the profile root
    /// is always an object. Indices are capped at [`MAX_INDEX`] and the
    /// [`RESERVED_ROOTS`] are off limits.
    pub fn validate(&self) -> Result<(), ProfileError> {
        // parent path -> whether its children are indices
        let mut parents: BTreeMap<&str, bool> = BTreeMap::new();

        for output in self.entries.keys() {
            let first = output.split('.').next().unwrap_or_default();
            if path::classify(first).is_index() {
                return Err(ProfileError::mapping(
                    output,
                    "the profile root is an object, not an array",
                ));
            }
            if RESERVED_ROOTS.contains(&first) {
                return Err(ProfileError::mapping(
                    output,
                    format!("`{first}` is set by the provider"),
                ));
            }
            for segment in path::split(output) {
                if let Segment::Index(index) = segment {
                    if index > MAX_INDEX {
                        return Err(ProfileError::mapping(
                            output,
                            ShapeError::IndexTooLarge { index }.to_string(),
                        ));
                    }
                }
            }

            for (pos, _) in output.match_indices('.') {
                let parent = &output[..pos];
                let child = output[pos + 1..].split('.').next().unwrap_or_default();
                let indexed = path::classify(child).is_index();

                if self.entries.contains_key(parent) {
                    return Err(ProfileError::mapping(
                        parent,
                        format!("mapped to a value but also the parent of `{output}`"),
                    ));
                }
                match parents.get(parent) {
                    Some(&seen) if seen != indexed => {
                        return Err(ProfileError::mapping(
                            parent,
                            "used both as an array and as an object",
                        ));
                    }
                    Some(_) => {}
                    None => {
                        parents.insert(parent, indexed);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Errors raised while building a normalized profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// The input text is not valid JSON.
    #[error("Failed to parse user profile")]
    Parse(#[source] serde_json::Error),
    /// An output path conflicts with the shape built so far.
    #[error("cannot map `{path}`: {reason}")]
    Mapping {
        /// The offending output path.
        path: String,
        /// What went wrong.
        reason: String,
    },
}

impl ProfileError {
    fn mapping(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ProfileError::Mapping {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Why a single step into the profile tree failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// The existing child is not the container the next segment needs.
    #[error("`{segment}` holds {found} but `{next}` needs {needed}")]
    Mismatch {
        /// Segment of the existing child.
        segment: String,
        /// Kind of value the child holds.
        found: &'static str,
        /// The segment that follows.
        next: String,
        /// Kind of container `next` requires.
        needed: &'static str,
    },
    /// The segment kind does not fit the node it is applied to.
    #[error("cannot address `{segment}` in {found}")]
    Unaddressable {
        /// The segment applied.
        segment: String,
        /// Kind of the node.
        found: &'static str,
    },
    /// The index is above [`MAX_INDEX`].
    #[error("index {index} is above the limit of {MAX_INDEX}")]
    IndexTooLarge {
        /// The requested index.
        index: usize,
    },
}

impl From<ProfileError> for AuthError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Parse(_) => AuthError::Parse(err.to_string()),
            ProfileError::Mapping { .. } => AuthError::Mapping(err.to_string()),
        }
    }
}

/// Input accepted by [`parse`]: JSON text or an already decoded document.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// JSON text, decoded before mapping.
    Text(&'a str),
    /// A decoded document.
    Json(&'a Value),
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(text: &'a str) -> Self {
        Source::Text(text)
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(text: &'a String) -> Self {
        Source::Text(text)
    }
}

impl<'a> From<&'a Value> for Source<'a> {
    fn from(document: &'a Value) -> Self {
        Source::Json(document)
    }
}

/// Build a normalized profile from `input` using `fields`, or
/// [`FieldSpec::default`] when no table is given.
///
/// Input paths that miss anywhere in the document yield `null`.
pub fn parse<'a>(
    input: impl Into<Source<'a>>,
    fields: Option<&FieldSpec>,
) -> Result<Map<String, Value>, ProfileError> {
    let decoded;
    let document = match input.into() {
        Source::Text(text) => {
            decoded = serde_json::from_str::<Value>(text).map_err(ProfileError::Parse)?;
            &decoded
        }
        Source::Json(document) => document,
    };

    let default_fields;
    let fields = match fields {
        Some(fields) => fields,
        None => {
            default_fields = FieldSpec::default();
            &default_fields
        }
    };
    fields.validate()?;

    let mut profile = Value::Object(Map::new());
    for (output, mapping) in fields.iter() {
        let value = match mapping {
            FieldMapping::Path(input) => path::resolve(document, input)
                .cloned()
                .unwrap_or(Value::Null),
            FieldMapping::Computed(compute) => compute(document),
        };
        assign(&mut profile, output, value)?;
    }

    match profile {
        Value::Object(map) => Ok(map),
        other => Err(ProfileError::mapping("", format!("root became {}", kind(&other)))),
    }
}

fn assign(root: &mut Value, output: &str, value: Value) -> Result<(), ProfileError> {
    let segments = path::split(output);
    let Some(last) = segments.last() else {
        return Ok(());
    };

    let mut node = root;
    for pair in segments.windows(2) {
        node = ensure_container(node, &pair[0], &pair[1])
            .map_err(|err| ProfileError::mapping(output, err.to_string()))?;
    }
    let slot =
        child_slot(node, last).map_err(|err| ProfileError::mapping(output, err.to_string()))?;
    if slot.is_object() || slot.is_array() {
        return Err(ProfileError::mapping(
            output,
            format!("`{last}` already holds {}", kind(slot)),
        ));
    }
    *slot = value;
    Ok(())
}

/// Step from `node` into its child at `segment`, creating the child when
/// vacant: an array if `next` is an index, an object otherwise.
///
/// A `null` child counts as vacant, which covers the holes left when an
/// array is padded. Any other child must already have the kind `next`
/// requires. Indices above [`MAX_INDEX`] are refused.
pub fn ensure_container<'a>(
    node: &'a mut Value,
    segment: &Segment,
    next: &Segment,
) -> Result<&'a mut Value, ShapeError> {
    let child = child_slot(node, segment)?;
    if child.is_null() {
        *child = match next {
            Segment::Index(_) => Value::Array(Vec::new()),
            Segment::Key(_) => Value::Object(Map::new()),
        };
        return Ok(child);
    }

    let fits = matches!(
        (&*child, next),
        (Value::Array(_), Segment::Index(_)) | (Value::Object(_), Segment::Key(_))
    );
    if fits {
        Ok(child)
    } else {
        Err(ShapeError::Mismatch {
            segment: segment.to_string(),
            found: kind(child),
            next: next.to_string(),
            needed: if next.is_index() { "an array" } else { "an object" },
        })
    }
}

fn child_slot<'a>(node: &'a mut Value, segment: &Segment) -> Result<&'a mut Value, ShapeError> {
    match (node, segment) {
        (Value::Object(map), Segment::Key(key)) => {
            Ok(map.entry(key.clone()).or_insert(Value::Null))
        }
        (Value::Array(items), &Segment::Index(index)) => {
            let len = index
                .checked_add(1)
                .filter(|len| *len <= MAX_INDEX + 1)
                .ok_or(ShapeError::IndexTooLarge { index })?;
            if items.len() < len {
                items.resize(len, Value::Null);
            }
            Ok(&mut items[index])
        }
        (node, segment) => Err(ShapeError::Unaddressable {
            segment: segment.to_string(),
            found: kind(node),
        }),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
