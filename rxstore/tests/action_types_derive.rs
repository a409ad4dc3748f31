//! Tests for #[derive(ActionTypes)] macro

use rxstore::{ActionChannel, ActionTypeSet, ActionTypes as ActionTypesRegistry};
use rxstore::ActionTypes;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn test_default_names_and_values() {
    #[derive(ActionTypes, Clone, Copy, Debug, PartialEq)]
    enum TodoAction {
        Add,
        ToggleDone,
        UndoRedo,
    }

    assert_eq!(TodoAction::Add.name(), "ADD");
    assert_eq!(TodoAction::ToggleDone.name(), "TOGGLE_DONE");
    assert_eq!(TodoAction::ToggleDone.value(), "TOGGLE_DONE");
    assert_eq!(TodoAction::UndoRedo.value(), "UNDO_REDO");
    assert_eq!(
        TodoAction::all(),
        &[TodoAction::Add, TodoAction::ToggleDone, TodoAction::UndoRedo]
    );
}

#[test]
fn test_prefix_and_overrides() {
    #[derive(ActionTypes, Clone, Copy, Debug, PartialEq)]
    #[action_types(prefix = "menu/")]
    enum MenuAction {
        Open,
        #[action_type(name = "SAVE_FILE")]
        Save,
        #[action_type(value = "UNDO_REDO")]
        UndoRedo,
    }

    assert_eq!(MenuAction::Open.value(), "menu/OPEN");
    assert_eq!(MenuAction::Save.name(), "SAVE_FILE");
    assert_eq!(MenuAction::Save.value(), "menu/SAVE_FILE");
    // explicit values skip the prefix
    assert_eq!(MenuAction::UndoRedo.value(), "UNDO_REDO");
}

#[test]
fn test_trait_impl_matches_inherent() {
    #[derive(ActionTypes, Clone, Copy, Debug, PartialEq)]
    #[action_types(prefix = "x/")]
    enum Action {
        Ping,
    }

    fn via_trait<T: ActionTypeSet>(t: T) -> (&'static str, &'static str) {
        (t.name(), t.value())
    }

    assert_eq!(via_trait(Action::Ping), ("PING", "x/PING"));
    assert_eq!(<Action as ActionTypeSet>::all().len(), 1);
}

#[test]
fn test_registry_from_derived_set() {
    #[derive(ActionTypes, Clone, Copy, Debug, PartialEq)]
    #[action_types(prefix = "todos/")]
    enum TodoAction {
        Add,
        Remove,
    }

    let types = ActionTypesRegistry::from_set::<TodoAction>();
    assert_eq!(types.len(), 2);
    assert_eq!(types.get("ADD"), Some("todos/ADD"));
    assert_eq!(types.get("REMOVE"), Some("todos/REMOVE"));
    assert!(types.has_value("todos/REMOVE"));
}

#[test]
fn test_channel_routes_derived_types() {
    #[derive(ActionTypes, Clone, Copy, Debug, PartialEq)]
    #[action_types(prefix = "todos/")]
    enum TodoAction {
        Add,
        Remove,
    }

    let channel: ActionChannel = ActionChannel::from_set::<TodoAction>();
    let adds = Rc::new(Cell::new(0));
    let counter = Rc::clone(&adds);
    let _sub = channel.subscribe(TodoAction::Add.name(), move |_| counter.set(counter.get() + 1));

    channel.dispatch(TodoAction::Add.value(), json!("milk"));
    channel.dispatch(TodoAction::Remove.value(), json!(0));

    assert_eq!(adds.get(), 1);
}
