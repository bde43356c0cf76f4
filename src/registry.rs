use std::collections::HashMap;

use crate::config::StoreConfig;
use crate::models::Version;

/// Maps item type names to storage tables and display routes
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    tables: HashMap<String, String>,
    routes: HashMap<String, String>,
}

impl TypeRegistry {
    pub fn new(tables: HashMap<String, String>, routes: HashMap<String, String>) -> Self {
        Self { tables, routes }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.entity_tables.clone(), config.item_routes.clone())
    }

    pub fn with_table(mut self, item_type: impl Into<String>, table: impl Into<String>) -> Self {
        self.tables.insert(item_type.into(), table.into());
        self
    }

    pub fn with_route(mut self, item_type: impl Into<String>, template: impl Into<String>) -> Self {
        self.routes.insert(item_type.into(), template.into());
        self
    }

    /// Table holding records of `item_type`: the configured name, else the
    /// pluralized snake_case of the last path segment (`Admin::UserRole` => `user_roles`).
    pub fn table_for(&self, item_type: &str) -> Result<String, String> {
        let table = match self.tables.get(item_type) {
            Some(t) => t.clone(),
            None => pluralize(&underscore(last_segment(item_type))),
        };
        validate_identifier(&table)?;
        Ok(table)
    }

    /// Best-effort display link for the record a version points at.
    /// Types without a route template get no link.
    pub fn item_url(&self, version: &Version) -> Option<String> {
        let template = self.routes.get(&version.item_type)?;
        Some(template.replace("{id}", &version.item_id.to_string()))
    }
}

/// Identifiers interpolated into SQL must be plain names
pub fn validate_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err("identifier cannot be empty".to_string()),
        Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
            return Err(format!("invalid identifier format: {}", name))
        }
        _ => {}
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("invalid identifier format: {}", name));
    }
    Ok(())
}

fn last_segment(item_type: &str) -> &str {
    item_type
        .rsplit(|c| c == ':' || c == '/')
        .find(|s| !s.is_empty())
        .unwrap_or(item_type)
}

fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_ascii_lowercase() || chars[i - 1].is_ascii_digit());
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            let prev_upper = i > 0 && chars[i - 1].is_ascii_uppercase();
            if prev_lower || (prev_upper && next_lower) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn pluralize(word: &str) -> String {
    if word.ends_with('s') || word.ends_with('x') || word.ends_with("ch") || word.ends_with("sh") {
        format!("{}es", word)
    } else if let Some(stem) = word.strip_suffix('y') {
        match stem.chars().last() {
            Some('a' | 'e' | 'i' | 'o' | 'u') | None => format!("{}s", word),
            Some(_) => format!("{}ies", stem),
        }
    } else {
        format!("{}s", word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Event;
    use chrono::Utc;

    #[test]
    fn derives_table_names() {
        let registry = TypeRegistry::default();
        assert_eq!(registry.table_for("Widget").unwrap(), "widgets");
        assert_eq!(registry.table_for("Company").unwrap(), "companies");
        assert_eq!(registry.table_for("Admin::UserRole").unwrap(), "user_roles");
        assert_eq!(registry.table_for("HTTPRequest").unwrap(), "http_requests");
        assert_eq!(registry.table_for("Box").unwrap(), "boxes");
    }

    #[test]
    fn configured_tables_win_and_are_validated() {
        let registry = TypeRegistry::default()
            .with_table("Person", "people")
            .with_table("Evil", "x; DROP TABLE versions");
        assert_eq!(registry.table_for("Person").unwrap(), "people");
        assert!(registry.table_for("Evil").is_err());
    }

    #[test]
    fn item_url_is_a_hint_only() {
        let registry = TypeRegistry::default().with_route("Widget", "/widgets/{id}");
        let mut version = Version {
            id: 1,
            item_type: "Widget".to_string(),
            item_id: 7,
            event: Event::Create,
            whodunnit: None,
            object: None,
            created_at: Utc::now(),
        };
        assert_eq!(registry.item_url(&version).as_deref(), Some("/widgets/7"));
        version.item_type = "Gadget".to_string();
        assert_eq!(registry.item_url(&version), None);
    }
}
