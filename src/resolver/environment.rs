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

//! Environment construction for resolutions.
//!
//! A script sees the global table, `self` when the provider binds one, and
//! one `$<attribute-id>` adapter per attribute of the entity it runs for.

use std::rc::Rc;

use super::{Attribute, Entity, ScriptResolver, SelfProvider};
use crate::interpreter::{Environment, HostObject, Value};

/// Prefix of attribute bindings.
pub const ATTRIBUTE_SIGIL: char = '$';

/// The binding name of an attribute, e.g. `$str`.
pub fn attribute_binding(attribute_id: &str) -> String {
    format!("{}{}", ATTRIBUTE_SIGIL, attribute_id)
}

/// The provider id under which an attribute's formula is cached.
pub fn attribute_provider_id(entity_id: &str, attribute_id: &str) -> String {
    format!("{}.{}", entity_id, attribute_id)
}

/// Exposes an attribute to scripts.
///
/// Properties: `id`, `name`, `formula` and `value`. Reading `value`
/// resolves the attribute's formula through the same resolver, one depth
/// level deeper, with the adapter itself bound as `self`.
#[derive(Clone)]
pub struct AttributeAdapter {
    resolver: ScriptResolver,
    entity: Rc<dyn Entity>,
    attribute: Rc<dyn Attribute>,
}

impl AttributeAdapter {
    /// Create an adapter for one attribute of `entity`.
    pub fn new(
        resolver: ScriptResolver,
        entity: Rc<dyn Entity>,
        attribute: Rc<dyn Attribute>,
    ) -> Self {
        Self {
            resolver,
            entity,
            attribute,
        }
    }

    /// The self provider used when resolving this attribute's formula.
    pub fn provider(&self) -> SelfProvider {
        SelfProvider::new(
            attribute_provider_id(self.entity.id(), self.attribute.id()),
            Value::host(self.clone()),
        )
    }

    /// Resolve the attribute's formula to a number.
    pub fn value(&self) -> f64 {
        self.resolver.resolve_to_number(
            Some(&self.entity),
            &self.provider(),
            self.attribute.formula(),
        )
    }
}

impl HostObject for AttributeAdapter {
    fn type_name(&self) -> &str {
        "Attribute"
    }

    fn get(&self, property: &str) -> Option<Value> {
        match property {
            "id" => Some(Value::from(self.attribute.id())),
            "name" => Some(Value::from(self.attribute.name())),
            "formula" => Some(Value::from(self.attribute.formula())),
            "value" => Some(Value::Number(self.value())),
            _ => None,
        }
    }
}

/// Build the environment for one resolution.
pub fn build_environment(
    resolver: &ScriptResolver,
    entity: Option<&Rc<dyn Entity>>,
    provider: &SelfProvider,
) -> Environment {
    let mut env = resolver.globals().clone();

    if let Some(value) = &provider.value {
        env.insert("self", value.clone());
    }

    if let Some(entity) = entity {
        for attribute in entity.attributes() {
            let name = attribute_binding(attribute.id());
            let adapter = AttributeAdapter::new(resolver.clone(), Rc::clone(entity), attribute);
            env.insert(name, Value::host(adapter));
        }
    }

    tracing::trace!(
        provider = %provider.id,
        bindings = env.len(),
        "built script environment"
    );
    env
}
