//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they only apply to fields that
//! no config file set.

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "CANOPY_DATABASE_PATH",
        field_path: "database.path",
    },
    EnvMapping {
        var_name: "CANOPY_DATABASE_BUSY_TIMEOUT_MS",
        field_path: "database.busy_timeout_ms",
    },
    EnvMapping {
        var_name: "CANOPY_RESOLVER_STRATEGY",
        field_path: "resolver.strategy",
    },
    EnvMapping {
        var_name: "CANOPY_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "CANOPY_LOG_FORMAT",
        field_path: "logging.format",
    },
];

/// Apply environment variable fallbacks to fields that were **not** set by
/// any config file layer.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources.contains_key(mapping.field_path) {
            continue;
        }
        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_field(merged, mapping.field_path, coerce(mapping.field_path, val));
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Set `section.key` in the tree, creating the section table if needed.
fn set_field(root: &mut toml::Value, path: &str, val: toml::Value) {
    let Some((section, key)) = path.split_once('.') else {
        return;
    };
    let Some(root_table) = root.as_table_mut() else {
        return;
    };
    let section_val = root_table
        .entry(section.to_owned())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    if let Some(table) = section_val.as_table_mut() {
        table.insert(key.to_owned(), val);
    }
}

/// Integer fields are parsed; anything unparsable stays a string and is
/// reported when the merged tree is deserialized.
fn coerce(path: &str, val: &str) -> toml::Value {
    if path == "database.busy_timeout_ms"
        && let Ok(i) = val.parse::<i64>()
    {
        return toml::Value::Integer(i);
    }
    toml::Value::String(val.to_owned())
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
