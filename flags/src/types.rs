use crate::schema::{
    MaterialsVisibility, OutOfServiceConfig, SectionsVisibility, ServicesVisibility,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

/// The closed set of remotely configurable domains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlagDomain {
    OutOfService,
    SectionsVisibility,
    ServicesVisibility,
    MaterialsVisibility,
}

impl FlagDomain {
    pub const ALL: [FlagDomain; 4] = [
        FlagDomain::OutOfService,
        FlagDomain::SectionsVisibility,
        FlagDomain::ServicesVisibility,
        FlagDomain::MaterialsVisibility,
    ];

    /// Identifier used as the top-level key of the remote payload.
    pub const fn as_str(&self) -> &'static str {
        match self {
            FlagDomain::OutOfService => "out-of-service",
            FlagDomain::SectionsVisibility => "sections-visibility",
            FlagDomain::ServicesVisibility => "services-visibility",
            FlagDomain::MaterialsVisibility => "materials-visibility",
        }
    }
}

impl fmt::Display for FlagDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("unknown flag domain: {0}")]
pub struct UnknownDomain(pub String);

impl FromStr for FlagDomain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlagDomain::ALL
            .into_iter()
            .find(|domain| domain.as_str() == s)
            .ok_or_else(|| UnknownDomain(s.to_string()))
    }
}

/// `enabled` gates whether `config` overrides the local defaults at all.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Toggle<C> {
    pub enabled: bool,
    pub config: Option<C>,
}

impl<C> Toggle<C> {
    pub fn new(enabled: bool, config: C) -> Self {
        Toggle {
            enabled,
            config: Some(config),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Flag {
    OutOfService(Toggle<OutOfServiceConfig>),
    SectionsVisibility(Toggle<SectionsVisibility>),
    ServicesVisibility(Toggle<ServicesVisibility>),
    MaterialsVisibility(Toggle<MaterialsVisibility>),
}

impl Flag {
    pub fn domain(&self) -> FlagDomain {
        match self {
            Flag::OutOfService(_) => FlagDomain::OutOfService,
            Flag::SectionsVisibility(_) => FlagDomain::SectionsVisibility,
            Flag::ServicesVisibility(_) => FlagDomain::ServicesVisibility,
            Flag::MaterialsVisibility(_) => FlagDomain::MaterialsVisibility,
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            Flag::OutOfService(t) => t.enabled,
            Flag::SectionsVisibility(t) => t.enabled,
            Flag::ServicesVisibility(t) => t.enabled,
            Flag::MaterialsVisibility(t) => t.enabled,
        }
    }
}

/// At most one flag per domain. The key is always derived from the flag itself,
/// so a set can never hold a flag under the wrong domain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlagSet {
    flags: BTreeMap<FlagDomain, Flag>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a flag, replacing any previous flag for the same domain.
    pub fn insert(&mut self, flag: Flag) -> Option<Flag> {
        self.flags.insert(flag.domain(), flag)
    }

    pub fn get(&self, domain: FlagDomain) -> Option<&Flag> {
        self.flags.get(&domain)
    }

    pub fn is_enabled(&self, domain: FlagDomain) -> bool {
        self.get(domain).is_some_and(Flag::enabled)
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn domains(&self) -> impl Iterator<Item = FlagDomain> + '_ {
        self.flags.keys().copied()
    }

    pub fn out_of_service(&self) -> Option<&Toggle<OutOfServiceConfig>> {
        match self.get(FlagDomain::OutOfService) {
            Some(Flag::OutOfService(t)) => Some(t),
            _ => None,
        }
    }

    pub fn sections(&self) -> Option<&Toggle<SectionsVisibility>> {
        match self.get(FlagDomain::SectionsVisibility) {
            Some(Flag::SectionsVisibility(t)) => Some(t),
            _ => None,
        }
    }

    pub fn services(&self) -> Option<&Toggle<ServicesVisibility>> {
        match self.get(FlagDomain::ServicesVisibility) {
            Some(Flag::ServicesVisibility(t)) => Some(t),
            _ => None,
        }
    }

    pub fn materials(&self) -> Option<&Toggle<MaterialsVisibility>> {
        match self.get(FlagDomain::MaterialsVisibility) {
            Some(Flag::MaterialsVisibility(t)) => Some(t),
            _ => None,
        }
    }
}

impl FromIterator<Flag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut set = FlagSet::new();
        for flag in iter {
            set.insert(flag);
        }
        set
    }
}

/// Snapshot of the synchronized state, as committed by the store.
#[derive(Clone, Debug, Default)]
pub struct SyncState {
    pub flags: Arc<FlagSet>,
    /// Time of the last refresh that changed `flags`.
    pub last_fetch: Option<SystemTime>,
    pub is_fetching: bool,
    pub last_error: Option<String>,
}
