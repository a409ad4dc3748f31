//! Action events, the action-type registry and undo/redo payloads

use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// An immutable `{type, data}` pair published through an
/// [`ActionChannel`](crate::ActionChannel).
///
/// `action_type` is the canonical value registered on the channel, not the
/// symbolic name used to subscribe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionEvent<D> {
    /// Canonical action type
    #[serde(rename = "type")]
    pub action_type: String,
    /// Opaque payload
    pub data: D,
}

impl<D> ActionEvent<D> {
    /// Create a new event
    pub fn new(action_type: impl Into<String>, data: D) -> Self {
        Self {
            action_type: action_type.into(),
            data,
        }
    }
}

/// Fixed mapping from symbolic action names to canonical type values
///
/// The set of names is established once at construction and never changes
/// afterwards. Computed values are evaluated while building, so reading a
/// name always yields the same value.
///
/// # Example
/// ```
/// use rxstore_core::ActionTypes;
///
/// let types = ActionTypes::builder()
///     .value("SAVE", "SAVE")
///     .computed("LOAD", || format!("{}/LOAD", "menu"))
///     .build();
///
/// assert_eq!(types.get("SAVE"), Some("SAVE"));
/// assert_eq!(types.get("LOAD"), Some("menu/LOAD"));
/// assert!(!types.contains("DELETE"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionTypes {
    entries: HashMap<String, String>,
}

impl ActionTypes {
    /// Create a registry from `(name, value)` pairs
    ///
    /// Empty names are skipped with a warning; they could never be subscribed to.
    pub fn new<I, K, V>(types: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        types
            .into_iter()
            .fold(Self::builder(), |builder, (name, value)| {
                builder.value(name, value)
            })
            .build()
    }

    /// Start building a registry that mixes direct and computed values
    pub fn builder() -> ActionTypesBuilder {
        ActionTypesBuilder::default()
    }

    /// Build a registry from a type implementing [`ActionTypeSet`]
    pub fn from_set<T: ActionTypeSet>() -> Self {
        Self::new(T::all().iter().map(|t| (t.name(), t.value())))
    }

    /// Canonical value for a symbolic name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Whether `name` is a registered symbolic name
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Whether `value` is the canonical value of some registered name
    pub fn has_value(&self, value: &str) -> bool {
        self.entries.values().any(|v| v == value)
    }

    /// Iterate over registered symbolic names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterate over `(name, value)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ActionTypes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Builder for [`ActionTypes`]
#[derive(Debug, Default)]
pub struct ActionTypesBuilder {
    entries: HashMap<String, String>,
}

impl ActionTypesBuilder {
    /// Register a name with a direct canonical value
    pub fn value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name.into(), value.into());
        self
    }

    /// Register a name whose canonical value is computed once, right now
    pub fn computed<F>(mut self, name: impl Into<String>, compute: F) -> Self
    where
        F: FnOnce() -> String,
    {
        self.insert(name.into(), compute());
        self
    }

    /// Freeze the registry
    pub fn build(self) -> ActionTypes {
        ActionTypes {
            entries: self.entries,
        }
    }

    fn insert(&mut self, name: String, value: String) {
        if name.is_empty() {
            warn!(value = %value, "ActionTypes: ignoring empty action name");
            return;
        }
        self.entries.insert(name, value);
    }
}

/// A closed set of action types, usually a unit enum
///
/// Use `#[derive(ActionTypes)]` from `rxstore-macros` to implement this trait.
///
/// # Example
/// ```
/// use rxstore_core::{ActionTypeSet, ActionTypes};
///
/// #[derive(Clone, Copy)]
/// enum MenuAction {
///     Save,
///     UndoRedo,
/// }
///
/// impl ActionTypeSet for MenuAction {
///     fn name(&self) -> &'static str {
///         match self {
///             MenuAction::Save => "SAVE",
///             MenuAction::UndoRedo => "UNDO_REDO",
///         }
///     }
///
///     fn value(&self) -> &'static str {
///         self.name()
///     }
///
///     fn all() -> &'static [Self] {
///         &[MenuAction::Save, MenuAction::UndoRedo]
///     }
/// }
///
/// let types = ActionTypes::from_set::<MenuAction>();
/// assert_eq!(types.len(), 2);
/// assert_eq!(types.get("UNDO_REDO"), Some("UNDO_REDO"));
/// ```
pub trait ActionTypeSet: Copy + 'static {
    /// Symbolic name used to subscribe
    fn name(&self) -> &'static str;

    /// Canonical value carried by dispatched events
    fn value(&self) -> &'static str;

    /// Every member of the set
    fn all() -> &'static [Self];
}

/// Direction of an undo/redo request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HistoryStep {
    /// Move the history cursor one entry back (`"--"`)
    Undo,
    /// Move the history cursor one entry forward (`"++"`)
    Redo,
}

impl HistoryStep {
    /// Payload token requesting an undo
    pub const UNDO_TOKEN: &'static str = "--";
    /// Payload token requesting a redo
    pub const REDO_TOKEN: &'static str = "++";

    /// Decode a payload token; anything else is neither direction
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            Self::UNDO_TOKEN => Some(Self::Undo),
            Self::REDO_TOKEN => Some(Self::Redo),
            _ => None,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Self::Undo => Self::UNDO_TOKEN,
            Self::Redo => Self::REDO_TOKEN,
        }
    }
}

impl From<HistoryStep> for serde_json::Value {
    fn from(step: HistoryStep) -> Self {
        serde_json::Value::String(step.token().to_string())
    }
}

/// Payloads that can carry an undo/redo request
///
/// A store only reacts to its reserved undo/redo action when the payload
/// decodes to a [`HistoryStep`]; other payloads leave the cursor alone.
pub trait UndoRedoPayload {
    fn history_step(&self) -> Option<HistoryStep>;
}

impl UndoRedoPayload for serde_json::Value {
    fn history_step(&self) -> Option<HistoryStep> {
        self.as_str().and_then(HistoryStep::from_token)
    }
}

impl UndoRedoPayload for String {
    fn history_step(&self) -> Option<HistoryStep> {
        HistoryStep::from_token(self)
    }
}

impl UndoRedoPayload for &'static str {
    fn history_step(&self) -> Option<HistoryStep> {
        HistoryStep::from_token(self)
    }
}

impl UndoRedoPayload for HistoryStep {
    fn history_step(&self) -> Option<HistoryStep> {
        Some(*self)
    }
}
