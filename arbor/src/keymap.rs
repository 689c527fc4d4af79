//! The events map: which key combos trigger which intents.
//!
//! The engine never sees raw key events -- an external shortcut library owns
//! those and is driven through the [`KeyBinder`] seam. What the engine owns is
//! the *table*: an ordered mapping from combo strings to [`EventSpec`]s, with a
//! built-in default and RON load/save for user overrides. Combos marked
//! `allowed_in_read_only` stay bound when a map is opened read-only; everything
//! else is unbound for the duration.

use crate::action::Action;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What a key combo is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpec {
    pub action: Action,
    /// Keep this combo dispatchable while editing is globally disabled.
    #[serde(default)]
    pub allowed_in_read_only: bool,
}

/// Binds and unbinds combos against the external shortcut library.
pub trait KeyBinder {
    fn bind(&mut self, combo: &str, spec: EventSpec);
    fn unbind(&mut self, combo: &str);
}

/// Ordered mapping from key-combo strings to event specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsMap {
    bindings: IndexMap<String, EventSpec>,
}

impl Default for EventsMap {
    fn default() -> Self {
        let read_only_ok = |action| EventSpec {
            action,
            allowed_in_read_only: true,
        };
        let editable_only = |action| EventSpec {
            action,
            allowed_in_read_only: false,
        };

        let mut bindings = IndexMap::new();
        bindings.insert("up".to_string(), read_only_ok(Action::Up));
        bindings.insert("down".to_string(), read_only_ok(Action::Down));
        bindings.insert("left".to_string(), read_only_ok(Action::Left));
        bindings.insert("right".to_string(), read_only_ok(Action::Right));
        bindings.insert("shift+up".to_string(), editable_only(Action::Up));
        bindings.insert("shift+down".to_string(), editable_only(Action::Down));
        bindings.insert("enter".to_string(), editable_only(Action::NewSibling));
        bindings.insert("tab".to_string(), editable_only(Action::NewChild));
        bindings.insert("del".to_string(), editable_only(Action::Delete));
        bindings.insert("space".to_string(), read_only_ok(Action::ToggleCollapse));
        bindings.insert("f2".to_string(), editable_only(Action::Edit));
        bindings.insert("esc".to_string(), read_only_ok(Action::Escape));
        bindings.insert("mod+x".to_string(), editable_only(Action::Cut));
        bindings.insert("mod+c".to_string(), read_only_ok(Action::Copy));
        bindings.insert("mod+v".to_string(), editable_only(Action::Paste));
        Self { bindings }
    }
}

impl EventsMap {
    pub fn get(&self, combo: &str) -> Option<&EventSpec> {
        self.bindings.get(combo)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventSpec)> {
        self.bindings.iter().map(|(combo, spec)| (combo.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind every combo, in map order.
    pub fn bind_all(&self, binder: &mut dyn KeyBinder) {
        for (combo, spec) in &self.bindings {
            binder.bind(combo, *spec);
        }
    }

    /// Unbind the combos that must not fire in a read-only session, leaving the
    /// allowed ones bound.
    pub fn unbind_editable(&self, binder: &mut dyn KeyBinder) {
        for (combo, spec) in &self.bindings {
            if !spec.allowed_in_read_only {
                binder.unbind(combo);
            }
        }
    }

    /// Load a map from a RON string.
    pub fn from_ron(ron_str: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(ron_str)
    }

    /// Load a map from a file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_ron(&contents)?)
    }

    /// Save the map to a RON string.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
    }
}
