//! Structured presentation state for a discussion, computed per actor.
//!
//! Hosts render badges, menu entries and title markers from these flags; no
//! markup is produced here.

use serde::Serialize;

use crate::discussion::Discussion;

/// The resolution menu action offered to privileged actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolutionToggle {
  /// The target state the action transitions to.
  pub resolve: bool,
  pub label:   &'static str,
}

impl ResolutionToggle {
  /// The action offering the opposite of the current state.
  pub fn for_state(resolved: bool) -> Self {
    if resolved {
      Self { resolve: false, label: "Unresolve" }
    } else {
      Self { resolve: true, label: "Resolve" }
    }
  }
}

/// A discussion together with what a particular actor should see.
#[derive(Debug, Clone, Serialize)]
pub struct DiscussionView {
  #[serde(flatten)]
  pub discussion:       Discussion,
  /// The actor may not comment; present the thread as closed.
  pub closed:           bool,
  /// Show the "Unresolved" tag next to the discussion meta.
  pub unresolved_tag:   bool,
  /// Prefix the title with a "[RESOLVED]" marker.
  pub resolved_marker:  bool,
  pub toggle:           Option<ResolutionToggle>,
  /// Offer the "Resolved" checkbox under the comment form.
  pub resolve_on_reply: bool,
}
