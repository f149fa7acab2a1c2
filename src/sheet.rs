// SheetScript - A sandboxed formula scripting runtime for character sheets
// Copyright (C) 2026  Marcel Joachim Kloubert <marcel@kloubert.dev>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! JSON character sheets.
//!
//! A sheet is the reference [`Entity`] used by the CLI and the tests:
//!
//! ```json
//! {
//!   "id": "conan",
//!   "name": "Conan",
//!   "entity_cache": true,
//!   "attributes": [
//!     { "id": "str", "name": "Strength", "formula": "18" },
//!     { "id": "str_mod", "name": "Strength Modifier", "formula": "floor(($str.value - 10) / 2)" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resolver::{Attribute, EntityCache, Entity, ScriptCache};

/// Errors that can occur while loading a sheet.
#[derive(Debug, Error)]
pub enum SheetError {
    /// The sheet file could not be read.
    #[error("Cannot read sheet '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The sheet is not valid JSON of the expected shape.
    #[error("Invalid sheet: {0}")]
    Json(#[from] serde_json::Error),

    /// Two attributes share an id.
    #[error("Duplicate attribute id '{0}'")]
    DuplicateAttribute(String),
}

/// One attribute of a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetAttribute {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub formula: String,
}

impl Attribute for SheetAttribute {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    fn formula(&self) -> &str {
        &self.formula
    }
}

#[derive(Debug, Deserialize)]
struct SheetData {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    attributes: Vec<SheetAttribute>,
    #[serde(default)]
    entity_cache: bool,
}

/// A character sheet loaded from JSON.
pub struct Sheet {
    id: String,
    name: String,
    attributes: Vec<Rc<SheetAttribute>>,
    cache: Option<Rc<EntityCache>>,
}

impl Sheet {
    /// Parse a sheet from JSON.
    pub fn from_json(json: &str) -> Result<Self, SheetError> {
        let data: SheetData = serde_json::from_str(json)?;

        let mut seen = HashSet::new();
        for attribute in &data.attributes {
            if !seen.insert(attribute.id.as_str()) {
                return Err(SheetError::DuplicateAttribute(attribute.id.clone()));
            }
        }

        Ok(Self {
            id: data.id,
            name: data.name,
            attributes: data.attributes.into_iter().map(Rc::new).collect(),
            cache: data.entity_cache.then(|| Rc::new(EntityCache::new())),
        })
    }

    /// Load a sheet file.
    pub fn load(path: &Path) -> Result<Self, SheetError> {
        let json = fs::read_to_string(path).map_err(|source| SheetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The sheet's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an attribute by id.
    pub fn attribute(&self, id: &str) -> Option<Rc<dyn Attribute>> {
        self.attributes
            .iter()
            .find(|attribute| attribute.id == id)
            .map(|attribute| Rc::clone(attribute) as Rc<dyn Attribute>)
    }

    /// Check whether the sheet owns a cache.
    pub fn has_own_cache(&self) -> bool {
        self.cache.is_some()
    }
}

impl Entity for Sheet {
    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> Vec<Rc<dyn Attribute>> {
        self.attributes
            .iter()
            .map(|attribute| Rc::clone(attribute) as Rc<dyn Attribute>)
            .collect()
    }

    fn script_cache(&self) -> Option<Rc<dyn ScriptCache>> {
        self.cache
            .as_ref()
            .map(|cache| Rc::clone(cache) as Rc<dyn ScriptCache>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{ScriptResolver, SelfProvider};

    const SHEET: &str = r#"{
        "id": "conan",
        "name": "Conan",
        "attributes": [
            { "id": "str", "name": "Strength", "formula": "18" },
            { "id": "str_mod", "formula": "floor(($str.value - 10) / 2)" }
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let sheet = Sheet::from_json(SHEET).unwrap();
        assert_eq!(sheet.id(), "conan");
        assert_eq!(sheet.name(), "Conan");
        assert_eq!(sheet.attributes().len(), 2);
        assert!(!sheet.has_own_cache());
        assert_eq!(sheet.attribute("str_mod").unwrap().name(), "str_mod");
        assert!(sheet.attribute("dex").is_none());
    }

    #[test]
    fn test_duplicate_attribute() {
        let json = r#"{ "id": "x", "attributes": [{ "id": "a" }, { "id": "a" }] }"#;
        assert!(matches!(
            Sheet::from_json(json),
            Err(SheetError::DuplicateAttribute(id)) if id == "a"
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(Sheet::from_json("{"), Err(SheetError::Json(_))));
        assert!(matches!(
            Sheet::load(Path::new("/nonexistent/sheet.json")),
            Err(SheetError::Io { .. })
        ));
    }

    #[test]
    fn test_resolve_against_sheet() {
        let entity: Rc<dyn Entity> = Rc::new(Sheet::from_json(SHEET).unwrap());
        let resolver = ScriptResolver::new();
        let provider = SelfProvider::unbound("cli");
        assert_eq!(
            resolver.resolve_to_number(Some(&entity), &provider, "$str_mod.value"),
            4.0
        );
    }

    #[test]
    fn test_entity_cache_flag() {
        let sheet = Sheet::from_json(r#"{ "id": "x", "entity_cache": true }"#).unwrap();
        assert!(sheet.has_own_cache());
        assert!(sheet.script_cache().is_some());
    }
}
