//! YAML document loading shared by the stack and config parsers.
//!
//! Each file is read twice. A generic [`Value`] pass, with merge keys applied,
//! checks required sections and reports unknown keys precisely. The typed pass
//! then decodes straight from the text, so scalars keep the form they were
//! written in (`1.10` stays `"1.10"`, `0x1F` stays `"0x1F"`).

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::value::MapAccessDeserializer;
use serde::de::{DeserializeOwned, Error as _, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Key that merges other mappings into the one it appears in.
pub const MERGE_KEY: &str = "<<";

/// Errors raised while loading a single YAML document.
#[derive(Debug, Error)]
pub enum DocumentError {
  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("unable to parse {}: {source}", path.display())]
  Syntax { path: PathBuf, source: serde_yaml::Error },

  #[error("malformed YAML file {}: {reason}", path.display())]
  Malformed { path: PathBuf, reason: String },

  #[error("unexpected field '{field}' under '{parent}' found in {}", path.display())]
  UnexpectedField {
    path: PathBuf,
    parent: String,
    field: String,
  },

  #[error("invalid value in {}: {source}", path.display())]
  Invalid { path: PathBuf, source: serde_yaml::Error },
}

impl DocumentError {
  pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
    Self::Malformed {
      path: path.to_path_buf(),
      reason: reason.into(),
    }
  }
}

/// Read a YAML file's text.
pub fn read_source(path: &Path) -> Result<String, DocumentError> {
  fs::read_to_string(path).map_err(|source| DocumentError::Read {
    path: path.to_path_buf(),
    source,
  })
}

/// Decode YAML text into a generic value with merge keys applied.
///
/// `path` is only used for error reporting.
pub fn parse_document(content: &str, path: &Path) -> Result<Value, DocumentError> {
  let syntax = |source| DocumentError::Syntax {
    path: path.to_path_buf(),
    source,
  };
  let mut document: Value = serde_yaml::from_str(content).map_err(syntax)?;
  document.apply_merge().map_err(syntax)?;
  Ok(document)
}

/// The document's top-level mapping.
pub fn root_mapping<'v>(document: &'v Value, path: &Path) -> Result<&'v Mapping, DocumentError> {
  document
    .as_mapping()
    .ok_or_else(|| DocumentError::malformed(path, "expected a mapping at the top level"))
}

/// Look up `key` in `parent`, requiring it to be a mapping.
///
/// `dotted` is the key's full path (e.g. `stack.apps`) for the error message.
pub fn require_mapping<'v>(
  parent: &'v Mapping,
  key: &str,
  dotted: &str,
  path: &Path,
) -> Result<&'v Mapping, DocumentError> {
  match parent.get(key) {
    Some(Value::Mapping(mapping)) => Ok(mapping),
    Some(other) => Err(DocumentError::malformed(
      path,
      format!("'{}' must be a mapping, found {}", dotted, kind(other)),
    )),
    None => Err(DocumentError::malformed(path, format!("'{}' is missing", dotted))),
  }
}

/// Look up `key` in `parent`, requiring a non-empty string.
pub fn require_string<'v>(parent: &'v Mapping, key: &str, dotted: &str, path: &Path) -> Result<&'v str, DocumentError> {
  match parent.get(key) {
    Some(Value::String(s)) if !s.is_empty() => Ok(s),
    Some(Value::String(_)) => Err(DocumentError::malformed(path, format!("'{}' is empty", dotted))),
    Some(other) => Err(DocumentError::malformed(
      path,
      format!("'{}' must be a string, found {}", dotted, kind(other)),
    )),
    None => Err(DocumentError::malformed(path, format!("'{}' is missing", dotted))),
  }
}

/// Fail on the first key of `mapping` that is not in `allowed`.
pub fn reject_unknown_keys(mapping: &Mapping, allowed: &[&str], parent: &str, path: &Path) -> Result<(), DocumentError> {
  for key in mapping.keys() {
    match key.as_str() {
      Some(name) if allowed.contains(&name) => {}
      _ => {
        return Err(DocumentError::UnexpectedField {
          path: path.to_path_buf(),
          parent: parent.to_string(),
          field: scalar_to_string(key).unwrap_or_else(|| kind(key).to_string()),
        });
      }
    }
  }
  Ok(())
}

/// Dotted label for a child mapping, e.g. `stack.apps.web1`.
pub fn child_label(parent: &str, key: &Value) -> String {
  format!("{}.{}", parent, scalar_to_string(key).unwrap_or_default())
}

/// Decode YAML text into a schema type.
pub fn decode_str<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T, DocumentError> {
  serde_yaml::from_str(content).map_err(|source| DocumentError::Invalid {
    path: path.to_path_buf(),
    source,
  })
}

/// String form of a scalar. `None` for null, sequences, mappings and tagged values.
pub fn scalar_to_string(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Sequence(_) => "a list",
    Value::Mapping(_) => "a mapping",
    Value::Tagged(_) => "a tagged value",
  }
}

/// A scalar in the form it was written.
///
/// Deserialized through `deserialize_str`, which hands over the source text
/// of plain scalars instead of the number or boolean they resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarText(pub String);

impl<'de> Deserialize<'de> for ScalarText {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_str(ScalarVisitor)
  }
}

struct ScalarVisitor;

impl Visitor<'_> for ScalarVisitor {
  type Value = ScalarText;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a scalar")
  }

  fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<ScalarText, E> {
    Ok(ScalarText(v.to_string()))
  }

  fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<ScalarText, E> {
    Ok(ScalarText(v.to_string()))
  }

  fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<ScalarText, E> {
    Ok(ScalarText(v.to_string()))
  }

  fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<ScalarText, E> {
    Ok(ScalarText(v.to_string()))
  }

  fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<ScalarText, E> {
    Ok(ScalarText(v.to_string()))
  }
}

/// The value of a merge key: one mapping or a list of them.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSource<T>(pub Vec<T>);

impl<T> Default for MergeSource<T> {
  fn default() -> Self {
    Self(Vec::new())
  }
}

impl<T> IntoIterator for MergeSource<T> {
  type Item = T;
  type IntoIter = std::vec::IntoIter<T>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for MergeSource<T> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_any(MergeSourceVisitor(PhantomData))
  }
}

struct MergeSourceVisitor<T>(PhantomData<T>);

impl<'de, T: Deserialize<'de>> Visitor<'de> for MergeSourceVisitor<T> {
  type Value = MergeSource<T>;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a mapping or a list of mappings to merge")
  }

  fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
    T::deserialize(MapAccessDeserializer::new(map)).map(|source| MergeSource(vec![source]))
  }

  fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
    let mut sources = Vec::new();
    while let Some(source) = seq.next_element()? {
      sources.push(source);
    }
    Ok(MergeSource(sources))
  }
}

/// A field set that may carry a `<<` merge key.
///
/// Fields set on the mapping itself win over merged ones, and an earlier
/// merge source wins over a later one.
pub trait MergeFields: Sized {
  fn take_sources(&mut self) -> MergeSource<Self>;

  /// Fill the fields `self` leaves unset from `other`.
  fn fill_from(&mut self, other: Self);

  fn resolve(mut self) -> Self {
    for source in self.take_sources() {
      self.fill_from(source.resolve());
    }
    self
  }
}

/// Set `slot` from `other` unless it is already set.
pub fn fill<T>(slot: &mut Option<T>, other: Option<T>) {
  if slot.is_none() {
    *slot = other;
  }
}

/// A mapping's entries in document order, keys taken as written and merge
/// keys resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Entries<V>(pub Vec<(String, V)>);

impl<V> Default for Entries<V> {
  fn default() -> Self {
    Self(Vec::new())
  }
}

impl<V> Entries<V> {
  fn contains(&self, key: &str) -> bool {
    self.0.iter().any(|(k, _)| k == key)
  }
}

impl<V> IntoIterator for Entries<V> {
  type Item = (String, V);
  type IntoIter = std::vec::IntoIter<(String, V)>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.into_iter()
  }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_map(EntriesVisitor(PhantomData))
  }
}

struct EntriesVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
  type Value = Entries<V>;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a mapping of key: value pairs")
  }

  fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
    let mut entries = Entries::default();
    let mut sources: Vec<MergeSource<Entries<V>>> = Vec::new();

    while let Some(ScalarText(key)) = map.next_key()? {
      if key == MERGE_KEY {
        sources.push(map.next_value()?);
      } else if entries.contains(&key) {
        return Err(A::Error::custom(format!("duplicate key '{}'", key)));
      } else {
        let value = map.next_value()?;
        entries.0.push((key, value));
      }
    }

    for (key, value) in sources.into_iter().flatten().flatten() {
      if !entries.contains(&key) {
        entries.0.push((key, value));
      }
    }
    Ok(entries)
  }
}

/// Deserialize a mapping of scalars into a string map.
///
/// Scalars keep their source text, null values become empty strings. Lists
/// and nested mappings are rejected. A present but null mapping is empty.
pub fn string_map<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
  D: Deserializer<'de>,
{
  let entries = Option::<Entries<Option<ScalarText>>>::deserialize(deserializer)?;
  Ok(Some(
    entries
      .unwrap_or_default()
      .into_iter()
      .map(|(key, value)| (key, value.map(|v| v.0).unwrap_or_default()))
      .collect(),
  ))
}

/// Deserialize a list of scalars into strings, preserving order.
pub fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
  D: Deserializer<'de>,
{
  let items = Option::<ScalarList>::deserialize(deserializer)?;
  Ok(Some(items.map(|list| list.0).unwrap_or_default()))
}

struct ScalarList(Vec<String>);

impl<'de> Deserialize<'de> for ScalarList {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_seq(ScalarListVisitor)
  }
}

struct ScalarListVisitor;

impl<'de> Visitor<'de> for ScalarListVisitor {
  type Value = ScalarList;

  fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("a list of scalars")
  }

  fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
    let mut items = Vec::new();
    while let Some(item) = seq.next_element::<Option<ScalarText>>()? {
      items.push(item.map(|v| v.0).unwrap_or_default());
    }
    Ok(ScalarList(items))
  }
}
