//! Edit-context state machine
//!
//! Per-resource tracking of edit scopes. Trusted edits nest (same
//! parameters or none); untrusted edits never nest, in either
//! direction. Illegal nestings are protocol violations — integration
//! bugs surfaced loudly, not data errors.

use super::{EngineError, EngineResult, Parameters};
use std::collections::HashMap;

/// State of an in-progress edit on one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    /// Trusted session, re-entrant up to `depth`
    TrustedEditing {
        /// Current nesting depth (>= 1)
        depth: u32,
        /// Parameters of the outermost scope
        parameters: Option<Parameters>,
    },
    /// Untrusted session; nothing may nest inside
    UntrustedEditing,
}

/// Per-URI table of active edit sessions.
#[derive(Debug, Default)]
pub struct EditTracker {
    active: HashMap<String, EditState>,
}

impl EditTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for a resource, if any session is active
    pub fn state(&self, uri: &str) -> Option<&EditState> {
        self.active.get(uri)
    }

    /// Enter a trusted edit scope. Returns true when this opens the
    /// outermost scope (the caller must then run the prepare hook).
    pub fn begin_trusted(
        &mut self,
        uri: &str,
        parameters: Option<&Parameters>,
    ) -> EngineResult<bool> {
        match self.active.get_mut(uri) {
            None => {
                self.active.insert(
                    uri.to_string(),
                    EditState::TrustedEditing {
                        depth: 1,
                        parameters: parameters.cloned(),
                    },
                );
                Ok(true)
            }
            Some(EditState::TrustedEditing {
                depth,
                parameters: outer,
            }) => {
                if let Some(inner) = parameters {
                    if outer.as_ref() != Some(inner) {
                        return Err(EngineError::ProtocolViolation(format!(
                            "nested trusted edit of <{}> with different parameters",
                            uri
                        )));
                    }
                }
                *depth += 1;
                Ok(false)
            }
            Some(EditState::UntrustedEditing) => Err(EngineError::ProtocolViolation(format!(
                "cannot nest an edit inside the untrusted edit of <{}>",
                uri
            ))),
        }
    }

    /// Leave a trusted edit scope. Returns true when the outermost
    /// scope was closed (the caller must then run the post-edit hook).
    pub fn end_trusted(&mut self, uri: &str) -> EngineResult<bool> {
        match self.active.get_mut(uri) {
            Some(EditState::TrustedEditing { depth, .. }) => {
                *depth -= 1;
                if *depth == 0 {
                    self.active.remove(uri);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            _ => Err(EngineError::ProtocolViolation(format!(
                "no trusted edit in progress on <{}>",
                uri
            ))),
        }
    }

    /// Enter an untrusted edit scope; only legal when no session is
    /// active at all.
    pub fn begin_untrusted(&mut self, uri: &str) -> EngineResult<()> {
        if self.active.contains_key(uri) {
            return Err(EngineError::ProtocolViolation(format!(
                "untrusted edit of <{}> while another edit is in progress",
                uri
            )));
        }
        self.active
            .insert(uri.to_string(), EditState::UntrustedEditing);
        Ok(())
    }

    /// Leave an untrusted edit scope (normal or exceptional exit)
    pub fn end_untrusted(&mut self, uri: &str) {
        if matches!(self.active.get(uri), Some(EditState::UntrustedEditing)) {
            self.active.remove(uri);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "http://x/base1/";

    fn params(k: &str, v: &str) -> Parameters {
        let mut p = Parameters::new();
        p.insert(k.to_string(), v.to_string());
        p
    }

    #[test]
    fn test_trusted_nesting() {
        let mut tracker = EditTracker::new();
        assert!(tracker.begin_trusted(URI, None).unwrap());
        assert!(!tracker.begin_trusted(URI, None).unwrap());
        assert!(!tracker.end_trusted(URI).unwrap());
        assert!(tracker.end_trusted(URI).unwrap());
        assert!(tracker.state(URI).is_none());
    }

    #[test]
    fn test_nested_trusted_same_parameters_ok() {
        let mut tracker = EditTracker::new();
        let p = params("k", "v");
        tracker.begin_trusted(URI, Some(&p)).unwrap();
        assert!(tracker.begin_trusted(URI, Some(&p)).is_ok());
        // None also nests fine.
        assert!(tracker.begin_trusted(URI, None).is_ok());
    }

    #[test]
    fn test_nested_trusted_different_parameters_rejected() {
        let mut tracker = EditTracker::new();
        tracker.begin_trusted(URI, Some(&params("k", "v"))).unwrap();
        assert!(matches!(
            tracker.begin_trusted(URI, Some(&params("k", "other"))),
            Err(EngineError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_untrusted_never_nests() {
        let mut tracker = EditTracker::new();
        tracker.begin_untrusted(URI).unwrap();

        assert!(matches!(
            tracker.begin_untrusted(URI),
            Err(EngineError::ProtocolViolation(_))
        ));
        assert!(matches!(
            tracker.begin_trusted(URI, None),
            Err(EngineError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_untrusted_inside_trusted_rejected() {
        let mut tracker = EditTracker::new();
        tracker.begin_trusted(URI, None).unwrap();
        assert!(matches!(
            tracker.begin_untrusted(URI),
            Err(EngineError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn test_sessions_are_per_resource() {
        let mut tracker = EditTracker::new();
        tracker.begin_untrusted(URI).unwrap();
        assert!(tracker.begin_trusted("http://x/other/", None).is_ok());
    }

    #[test]
    fn test_end_untrusted_clears_state() {
        let mut tracker = EditTracker::new();
        tracker.begin_untrusted(URI).unwrap();
        tracker.end_untrusted(URI);
        assert!(tracker.begin_untrusted(URI).is_ok());
    }

    #[test]
    fn test_end_trusted_without_session_is_violation() {
        let mut tracker = EditTracker::new();
        assert!(matches!(
            tracker.end_trusted(URI),
            Err(EngineError::ProtocolViolation(_))
        ));
    }
}
