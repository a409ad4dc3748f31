//! Dispatch middleware for action channels
//!
//! Middleware is the extension point of an [`ActionChannel`](crate::ActionChannel):
//! it sees every accepted event before and after fan-out, without being able
//! to change what gets delivered.

use crate::action::ActionEvent;
use std::fmt;

/// Middleware trait for observing dispatched actions
///
/// Implement this trait to add logging, auditing or metrics to a channel.
pub trait Middleware<D> {
    /// Called before the event is published to subscribers
    fn before(&mut self, event: &ActionEvent<D>);

    /// Called after every matching subscriber has run
    fn after(&mut self, event: &ActionEvent<D>, notified: usize);
}

/// A no-op middleware that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMiddleware;

impl<D> Middleware<D> for NoopMiddleware {
    fn before(&mut self, _event: &ActionEvent<D>) {}
    fn after(&mut self, _event: &ActionEvent<D>, _notified: usize) {}
}

/// Which action types a [`LoggingMiddleware`] reports, as glob patterns
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
#[derive(Debug, Clone, Default)]
pub struct ActionLoggerConfig {
    /// If non-empty, only log actions matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude actions matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl ActionLoggerConfig {
    /// Create a config from comma-separated pattern strings
    ///
    /// # Example
    /// ```
    /// use rxstore_core::ActionLoggerConfig;
    ///
    /// let config = ActionLoggerConfig::new(Some("menu/*,SAVE"), Some("menu/HOVER*"));
    /// assert!(config.should_log("menu/OPEN"));
    /// assert!(config.should_log("SAVE"));
    /// assert!(!config.should_log("menu/HOVER_IN"));
    /// assert!(!config.should_log("UNDO_REDO"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        Self {
            include_patterns: include.map(split_patterns).unwrap_or_default(),
            exclude_patterns: exclude.map(split_patterns).unwrap_or_default(),
        }
    }

    /// Check if an action type should be logged
    pub fn should_log(&self, action_type: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self
                .include_patterns
                .iter()
                .any(|p| glob_match(p, action_type))
        {
            return false;
        }

        !self
            .exclude_patterns
            .iter()
            .any(|p| glob_match(p, action_type))
    }
}

fn split_patterns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Middleware that logs dispatched actions through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LoggingMiddleware {
    /// Whether to log before fan-out
    pub log_before: bool,
    /// Whether to log after fan-out
    pub log_after: bool,
    /// Which action types to report
    pub filter: ActionLoggerConfig,
}

impl LoggingMiddleware {
    /// Create a new logging middleware with default settings (log after only)
    pub fn new() -> Self {
        Self {
            log_before: false,
            log_after: true,
            filter: ActionLoggerConfig::default(),
        }
    }

    /// Create a logging middleware that logs both before and after
    pub fn verbose() -> Self {
        Self {
            log_before: true,
            ..Self::new()
        }
    }

    /// Restrict logging to the action types accepted by `filter`
    pub fn with_filter(mut self, filter: ActionLoggerConfig) -> Self {
        self.filter = filter;
        self
    }
}

impl<D: fmt::Debug> Middleware<D> for LoggingMiddleware {
    fn before(&mut self, event: &ActionEvent<D>) {
        if self.log_before && self.filter.should_log(&event.action_type) {
            tracing::debug!(
                action = %event.action_type,
                data = ?event.data,
                "Dispatching action"
            );
        }
    }

    fn after(&mut self, event: &ActionEvent<D>, notified: usize) {
        if self.log_after && self.filter.should_log(&event.action_type) {
            tracing::debug!(
                action = %event.action_type,
                notified = notified,
                "Action dispatched"
            );
        }
    }
}

/// Several middleware run as one
///
/// `before` hooks run in insertion order and `after` hooks in reverse, so the
/// first stage wraps the rest. A stage added with [`add_scoped`](Self::add_scoped)
/// only sees events whose type passes its scope.
pub struct ComposedMiddleware<D> {
    stages: Vec<Stage<D>>,
}

struct Stage<D> {
    scope: Option<ActionLoggerConfig>,
    middleware: Box<dyn Middleware<D>>,
}

impl<D> Stage<D> {
    fn accepts(&self, event: &ActionEvent<D>) -> bool {
        self.scope
            .as_ref()
            .map_or(true, |scope| scope.should_log(&event.action_type))
    }
}

impl<D> fmt::Debug for ComposedMiddleware<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scopes: Vec<_> = self.stages.iter().map(|stage| &stage.scope).collect();
        f.debug_struct("ComposedMiddleware")
            .field("scopes", &scopes)
            .finish()
    }
}

impl<D> Default for ComposedMiddleware<D> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<D> ComposedMiddleware<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stage that sees every event
    pub fn add<M: Middleware<D> + 'static>(&mut self, middleware: M) {
        self.stages.push(Stage {
            scope: None,
            middleware: Box::new(middleware),
        });
    }

    /// Add a stage that only sees events accepted by `scope`
    pub fn add_scoped<M: Middleware<D> + 'static>(&mut self, scope: ActionLoggerConfig, middleware: M) {
        self.stages.push(Stage {
            scope: Some(scope),
            middleware: Box::new(middleware),
        });
    }

    /// Builder form of [`add`](Self::add)
    pub fn with<M: Middleware<D> + 'static>(mut self, middleware: M) -> Self {
        self.add(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<D> Middleware<D> for ComposedMiddleware<D> {
    fn before(&mut self, event: &ActionEvent<D>) {
        self.stages
            .iter_mut()
            .filter(|stage| stage.accepts(event))
            .for_each(|stage| stage.middleware.before(event));
    }

    fn after(&mut self, event: &ActionEvent<D>, notified: usize) {
        self.stages
            .iter_mut()
            .rev()
            .filter(|stage| stage.accepts(event))
            .for_each(|stage| stage.middleware.after(event, notified));
    }
}

/// Match an action type against a glob
///
/// `*` spans any run of characters (including none), `?` exactly one.
pub fn glob_match(pattern: &str, action_type: &str) -> bool {
    let mut segments = pattern.split('*');
    let head = segments.next().unwrap_or("");
    let Some(mut rest) = strip_segment(action_type, head) else {
        return false;
    };

    let tail: Vec<&str> = segments.collect();
    let Some((last, middle)) = tail.split_last() else {
        // no `*`: the head must cover the whole type
        return rest.is_empty();
    };

    for segment in middle {
        match find_segment(rest, segment) {
            Some(after) => rest = after,
            None => return false,
        }
    }
    ends_with_segment(rest, last)
}

/// `text` after a leading `segment`, honouring `?`
fn strip_segment<'a>(text: &'a str, segment: &str) -> Option<&'a str> {
    let mut chars = text.chars();
    for expected in segment.chars() {
        let actual = chars.next()?;
        if expected != '?' && expected != actual {
            return None;
        }
    }
    Some(chars.as_str())
}

/// `text` after the leftmost occurrence of `segment`
fn find_segment<'a>(text: &'a str, segment: &str) -> Option<&'a str> {
    text.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .find_map(|offset| strip_segment(&text[offset..], segment))
}

fn ends_with_segment(text: &str, segment: &str) -> bool {
    let width = segment.chars().count();
    if width == 0 {
        return true;
    }
    match text.char_indices().rev().nth(width - 1) {
        Some((offset, _)) => strip_segment(&text[offset..], segment) == Some(""),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("SAVE", "SAVE"));
        assert!(!glob_match("SAVE", "SAVE_AS"));
        assert!(glob_match("menu/*", "menu/OPEN"));
        assert!(glob_match("*_REDO", "UNDO_REDO"));
        assert!(glob_match("UNDO?REDO", "UNDO_REDO"));
        assert!(!glob_match("UNDO?REDO", "UNDOREDO"));
        assert!(glob_match("*", ""));
        assert!(glob_match("menu/*/open", "menu/file/open"));
        assert!(glob_match("a*b*c", "aXbYbZc"));
        assert!(!glob_match("a*b*c", "aXcYb"));
        assert!(glob_match("*ab", "aab"));
        assert!(!glob_match("*abc", "bc"));
        assert!(glob_match("größe/?", "größe/ä"));
    }

    #[test]
    fn test_config_defaults_log_everything() {
        let config = ActionLoggerConfig::default();
        assert!(config.should_log("ANYTHING"));
    }

    #[test]
    fn test_config_include_and_exclude() {
        let config = ActionLoggerConfig::new(Some("grid/*"), Some("grid/SCROLL*, "));
        assert_eq!(config.exclude_patterns, vec!["grid/SCROLL*".to_string()]);
        assert!(config.should_log("grid/SELECT"));
        assert!(!config.should_log("grid/SCROLL_DOWN"));
        assert!(!config.should_log("form/SUBMIT"));
    }

    struct Trace {
        label: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Middleware<u8> for Trace {
        fn before(&mut self, event: &ActionEvent<u8>) {
            self.log
                .borrow_mut()
                .push(format!("{}:before:{}", self.label, event.action_type));
        }

        fn after(&mut self, _event: &ActionEvent<u8>, notified: usize) {
            self.log
                .borrow_mut()
                .push(format!("{}:after:{}", self.label, notified));
        }
    }

    #[test]
    fn test_composed_nests_after_calls() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut composed = ComposedMiddleware::new();
        composed.add(Trace {
            label: "a",
            log: Rc::clone(&log),
        });
        composed.add(Trace {
            label: "b",
            log: Rc::clone(&log),
        });

        let event = ActionEvent::new("X", 0u8);
        composed.before(&event);
        composed.after(&event, 2);

        assert_eq!(
            *log.borrow(),
            vec!["a:before:X", "b:before:X", "b:after:2", "a:after:2"]
        );
    }

    #[test]
    fn test_scoped_stage_only_sees_matching_types() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut composed: ComposedMiddleware<u8> = ComposedMiddleware::new().with(Trace {
            label: "all",
            log: Rc::clone(&log),
        });
        composed.add_scoped(
            ActionLoggerConfig::new(Some("menu/*"), None),
            Trace {
                label: "menu",
                log: Rc::clone(&log),
            },
        );

        for action_type in ["menu/OPEN", "SAVE"] {
            let event = ActionEvent::new(action_type, 0u8);
            composed.before(&event);
            composed.after(&event, 1);
        }

        assert_eq!(
            *log.borrow(),
            vec![
                "all:before:menu/OPEN",
                "menu:before:menu/OPEN",
                "menu:after:1",
                "all:after:1",
                "all:before:SAVE",
                "all:after:1",
            ]
        );
    }
}
