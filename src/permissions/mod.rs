use serde::{Deserialize, Serialize};

use crate::config::PermissionsConfig;
use crate::models::Version;
use crate::types::AccessLevel;

/// Identity of whoever is making the request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user: Option<String>,
    pub access: AccessLevel,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self { user: None, access: AccessLevel::Anonymous }
    }

    pub fn user(name: impl Into<String>, access: AccessLevel) -> Self {
        Self { user: Some(name.into()), access }
    }
}

impl Default for Caller {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Yes/no decisions for the three change actions. Hosts plug in their own.
pub trait PermissionOracle: Send + Sync {
    fn allow_index(&self, caller: &Caller) -> bool;
    fn allow_show(&self, caller: &Caller, version: &Version) -> bool;
    fn allow_revert(&self, caller: &Caller, version: &Version) -> bool;
}

/// Permits everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionOracle for AllowAll {
    fn allow_index(&self, _caller: &Caller) -> bool {
        true
    }

    fn allow_show(&self, _caller: &Caller, _version: &Version) -> bool {
        true
    }

    fn allow_revert(&self, _caller: &Caller, _version: &Version) -> bool {
        true
    }
}

/// Grants each action to callers at or above a minimum access level
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    index: AccessLevel,
    show: AccessLevel,
    revert: AccessLevel,
}

impl AccessPolicy {
    pub fn new(index: AccessLevel, show: AccessLevel, revert: AccessLevel) -> Self {
        Self { index, show, revert }
    }

    pub fn from_config(config: &PermissionsConfig) -> Self {
        Self::new(config.index, config.show, config.revert)
    }
}

impl PermissionOracle for AccessPolicy {
    fn allow_index(&self, caller: &Caller) -> bool {
        caller.access >= self.index
    }

    fn allow_show(&self, caller: &Caller, _version: &Version) -> bool {
        caller.access >= self.show
    }

    fn allow_revert(&self, caller: &Caller, version: &Version) -> bool {
        let allowed = caller.access >= self.revert;
        if !allowed {
            tracing::debug!(
                "Revert of version {} denied for {:?} ({} < {})",
                version.id, caller.user, caller.access, self.revert
            );
        }
        allowed
    }
}
