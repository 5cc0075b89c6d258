//! Capabilities and the [`Authorizer`] trait.
//!
//! Capabilities form a small hierarchy: a broader capability satisfies every
//! check for a narrower one it subsumes. Checks go through
//! [`Authorizer::holds`], never through two separate lookups.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::discussion::UserId;

/// A named permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
  /// Toggle resolution on any discussion and see unresolved listings.
  #[serde(rename = "resolution.manage")]
  ResolutionManage,
  /// General moderation. Subsumes [`Capability::ResolutionManage`].
  #[serde(rename = "moderation.manage")]
  ModerationManage,
}

impl Capability {
  pub const ALL: [Capability; 2] = [Self::ResolutionManage, Self::ModerationManage];

  /// Whether holding `self` satisfies a check for `other`.
  pub fn subsumes(self, other: Capability) -> bool {
    match (self, other) {
      (a, b) if a == b => true,
      (Self::ModerationManage, Self::ResolutionManage) => true,
      _ => false,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      Self::ResolutionManage => "resolution.manage",
      Self::ModerationManage => "moderation.manage",
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Answers capability questions about an acting user.
pub trait Authorizer: Send + Sync {
  /// Whether `actor` was granted exactly `capability`.
  fn has_capability(&self, actor: UserId, capability: Capability) -> bool;

  /// Whether `actor` holds `capability` or any capability subsuming it.
  fn holds(&self, actor: UserId, capability: Capability) -> bool {
    Capability::ALL
      .into_iter()
      .any(|c| c.subsumes(capability) && self.has_capability(actor, c))
  }
}

// ─── Static grants ───────────────────────────────────────────────────────────

/// An [`Authorizer`] backed by a fixed grant table, typically loaded from
/// configuration at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
  grants: HashMap<UserId, HashSet<Capability>>,
}

impl StaticAuthorizer {
  pub fn new() -> Self { Self::default() }

  /// Builder-style grant.
  pub fn grant(mut self, user: UserId, capability: Capability) -> Self {
    self.insert(user, capability);
    self
  }

  pub fn insert(&mut self, user: UserId, capability: Capability) {
    self.grants.entry(user).or_default().insert(capability);
  }
}

impl FromIterator<(UserId, Capability)> for StaticAuthorizer {
  fn from_iter<I: IntoIterator<Item = (UserId, Capability)>>(iter: I) -> Self {
    let mut authz = Self::new();
    for (user, capability) in iter {
      authz.insert(user, capability);
    }
    authz
  }
}

impl Authorizer for StaticAuthorizer {
  fn has_capability(&self, actor: UserId, capability: Capability) -> bool {
    self
      .grants
      .get(&actor)
      .is_some_and(|caps| caps.contains(&capability))
  }
}
