//! Document normalization
//!
//! Turns a raw API description into self-contained routes: local `$ref`
//! pointers are replaced by their targets, then every operation under `paths`
//! becomes a [`Route`] carrying its path-level parameters.

use relay_core::domain::document::{HTTP_METHODS, Route};
use serde_json::{Map, Value as JsonValue};

/// Longest chain of `$ref` hops followed while resolving one value
pub const MAX_REF_HOPS: usize = 64;

/// Deepest nesting of the dereferenced document
pub const MAX_NESTING: usize = 256;

/// Upper bound on the number of JSON values the dereferenced document holds
pub const MAX_RESOLVED_NODES: usize = 250_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// A local `$ref` points at nothing
    UnresolvedRef(String),
    /// The document is not an object with a `paths` object
    MissingPaths,
    /// Following `$ref`s nests deeper than [`MAX_REF_HOPS`] or [`MAX_NESTING`]
    TooDeep(String),
    /// Dereferencing would produce more than [`MAX_RESOLVED_NODES`] values
    TooLarge,
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::UnresolvedRef(reference) => {
                write!(f, "unresolved reference '{}'", reference)
            }
            NormalizeError::MissingPaths => {
                write!(f, "document must be an object with a 'paths' object")
            }
            NormalizeError::TooDeep(reference) => {
                write!(f, "references nest too deeply at '{}'", reference)
            }
            NormalizeError::TooLarge => write!(
                f,
                "dereferenced document exceeds {} values",
                MAX_RESOLVED_NODES
            ),
        }
    }
}

/// Replace every local `$ref` in `document` with the value it points to
///
/// Keys next to a `$ref` override the same keys of the resolved object.
/// A reference that closes a cycle is kept as-is; references to other files
/// or URLs are not followed. Expansion is bounded in depth and in size.
pub fn dereference(document: &JsonValue) -> Result<JsonValue, NormalizeError> {
    Resolver::new(document).resolve(document)
}

/// Walks a document while tracking the open `$ref` chain and the budget spent
struct Resolver<'a> {
    root: &'a JsonValue,
    refs: Vec<&'a str>,
    depth: usize,
    nodes: usize,
}

impl<'a> Resolver<'a> {
    fn new(root: &'a JsonValue) -> Self {
        Self {
            root,
            refs: Vec::new(),
            depth: 0,
            nodes: 0,
        }
    }

    fn resolve(&mut self, value: &'a JsonValue) -> Result<JsonValue, NormalizeError> {
        self.nodes += 1;
        if self.nodes > MAX_RESOLVED_NODES {
            return Err(NormalizeError::TooLarge);
        }
        if self.depth >= MAX_NESTING {
            let at = self.refs.last().copied().unwrap_or("#");
            return Err(NormalizeError::TooDeep(at.to_string()));
        }

        self.depth += 1;
        let resolved = self.resolve_value(value);
        self.depth -= 1;
        resolved
    }

    fn resolve_value(&mut self, value: &'a JsonValue) -> Result<JsonValue, NormalizeError> {
        match value {
            JsonValue::Object(map) => match map.get("$ref").and_then(JsonValue::as_str) {
                Some(reference) if reference.starts_with('#') => self.resolve_ref(reference, map),
                Some(_) => Ok(value.clone()),
                None => {
                    let mut resolved = Map::with_capacity(map.len());
                    for (key, inner) in map {
                        resolved.insert(key.clone(), self.resolve(inner)?);
                    }
                    Ok(JsonValue::Object(resolved))
                }
            },
            JsonValue::Array(items) => items
                .iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            _ => Ok(value.clone()),
        }
    }

    fn resolve_ref(
        &mut self,
        reference: &'a str,
        node: &'a Map<String, JsonValue>,
    ) -> Result<JsonValue, NormalizeError> {
        if self.refs.contains(&reference) {
            return Ok(JsonValue::Object(node.clone()));
        }
        if self.refs.len() >= MAX_REF_HOPS {
            return Err(NormalizeError::TooDeep(reference.to_string()));
        }

        let target = self
            .root
            .pointer(&reference[1..])
            .ok_or_else(|| NormalizeError::UnresolvedRef(reference.to_string()))?;

        self.refs.push(reference);
        let resolved = self.resolve(target);
        self.refs.pop();
        let mut resolved = resolved?;

        if let JsonValue::Object(target_map) = &mut resolved {
            for (key, sibling) in node.iter().filter(|(key, _)| key.as_str() != "$ref") {
                target_map.insert(key.clone(), self.resolve(sibling)?);
            }
        }

        Ok(resolved)
    }
}

/// Extract one route per operation of a dereferenced document
///
/// Routes come out sorted by path, then by method in [`HTTP_METHODS`] order.
pub fn extract_routes(document: &JsonValue) -> Result<Vec<Route>, NormalizeError> {
    let paths = document
        .get("paths")
        .and_then(JsonValue::as_object)
        .ok_or(NormalizeError::MissingPaths)?;

    let mut entries: Vec<_> = paths.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut routes = Vec::new();
    for (path, item) in entries {
        let Some(item) = item.as_object() else {
            continue;
        };
        let shared_params = item
            .get("parameters")
            .and_then(JsonValue::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for method in HTTP_METHODS {
            let Some(operation) = item.get(method).filter(|op| op.is_object()) else {
                continue;
            };

            let mut operation = operation.clone();
            merge_parameters(&mut operation, shared_params);

            routes.push(Route {
                method: method.to_ascii_uppercase(),
                path: path.clone(),
                operation_id: string_field(&operation, "operationId"),
                summary: string_field(&operation, "summary"),
                operation,
            });
        }
    }

    Ok(routes)
}

/// Append path-level parameters the operation does not override
///
/// Parameters are identified by their `name` and `in` fields.
fn merge_parameters(operation: &mut JsonValue, shared: &[JsonValue]) {
    if shared.is_empty() {
        return;
    }

    let mut merged = operation
        .get("parameters")
        .and_then(JsonValue::as_array)
        .cloned()
        .unwrap_or_default();

    for param in shared {
        let overridden = merged.iter().any(|existing| {
            existing.get("name") == param.get("name") && existing.get("in") == param.get("in")
        });
        if !overridden {
            merged.push(param.clone());
        }
    }

    if let Some(map) = operation.as_object_mut() {
        map.insert("parameters".to_string(), JsonValue::Array(merged));
    }
}

fn string_field(value: &JsonValue, key: &str) -> Option<String> {
    value.get(key).and_then(JsonValue::as_str).map(str::to_string)
}
