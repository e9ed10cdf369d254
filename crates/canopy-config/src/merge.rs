//! Deep merge of TOML layers.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from an overlay never resets the value below it.

use std::collections::HashMap;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayer {
    /// System-wide configuration (`/etc/canopy/config.toml`).
    System,
    /// User-level configuration (`~/.canopy/config.toml`).
    User,
    /// A file named by the caller.
    Explicit,
    /// Environment variable fallback.
    Environment,
}

impl std::fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system (/etc/canopy/config.toml)"),
            Self::User => write!(f, "user (~/.canopy/config.toml)"),
            Self::Explicit => write!(f, "explicit config file"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Dotted field path to the layer that last set it. Fields left at their
/// built-in default have no entry.
pub type FieldSources = HashMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording which layer set each leaf.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: &ConfigLayer,
    sources: &mut FieldSources,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val, &path, layer, sources);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, layer, sources);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            record_leaves(overlay, prefix, layer, sources);
        },
    }
}

fn record_leaves(val: &toml::Value, prefix: &str, layer: &ConfigLayer, sources: &mut FieldSources) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &format!("{prefix}.{key}"), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_replaces_only_given_fields() {
        let mut base = value("[database]\npath = \"a.db\"\nbusy_timeout_ms = 5000\n");
        let overlay = value("[database]\npath = \"b.db\"\n");
        let mut sources = FieldSources::new();
        deep_merge(&mut base, &overlay, "", &ConfigLayer::User, &mut sources);

        assert_eq!(base["database"]["path"].as_str(), Some("b.db"));
        assert_eq!(base["database"]["busy_timeout_ms"].as_integer(), Some(5000));
        assert_eq!(sources.get("database.path"), Some(&ConfigLayer::User));
        assert!(!sources.contains_key("database.busy_timeout_ms"));
    }

    #[test]
    fn test_new_tables_record_every_leaf() {
        let mut base = value("[database]\npath = \"a.db\"\n");
        let overlay = value("[logging]\nlevel = \"debug\"\nformat = \"json\"\n");
        let mut sources = FieldSources::new();
        deep_merge(&mut base, &overlay, "", &ConfigLayer::System, &mut sources);

        assert_eq!(sources.get("logging.level"), Some(&ConfigLayer::System));
        assert_eq!(sources.get("logging.format"), Some(&ConfigLayer::System));
    }

    #[test]
    fn test_arrays_are_replaced() {
        let mut base = value("[logging]\ndirectives = [\"a=debug\", \"b=warn\"]\n");
        let overlay = value("[logging]\ndirectives = [\"c=trace\"]\n");
        let mut sources = FieldSources::new();
        deep_merge(&mut base, &overlay, "", &ConfigLayer::Explicit, &mut sources);
        assert_eq!(base["logging"]["directives"].as_array().map(Vec::len), Some(1));
    }
}
