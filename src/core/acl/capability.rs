// src/core/acl/capability.rs

use bitflags::bitflags;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// A named permission gating one protocol command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum Capability {
    Authenticate,
    CheckVersion,
    Update,
    GetState,
    Play,
    Pause,
    Unpause,
    Stop,
}

bitflags! {
    /// The set of capabilities granted to one identity.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CapabilitySet: u16 {
        const AUTHENTICATE  = 1 << 0;
        const CHECK_VERSION = 1 << 1;
        const UPDATE        = 1 << 2;
        const GET_STATE     = 1 << 3;
        const PLAY          = 1 << 4;
        const PAUSE         = 1 << 5;
        const UNPAUSE       = 1 << 6;
        const STOP          = 1 << 7;
    }
}

impl From<Capability> for CapabilitySet {
    fn from(capability: Capability) -> Self {
        match capability {
            Capability::Authenticate => CapabilitySet::AUTHENTICATE,
            Capability::CheckVersion => CapabilitySet::CHECK_VERSION,
            Capability::Update => CapabilitySet::UPDATE,
            Capability::GetState => CapabilitySet::GET_STATE,
            Capability::Play => CapabilitySet::PLAY,
            Capability::Pause => CapabilitySet::PAUSE,
            Capability::Unpause => CapabilitySet::UNPAUSE,
            Capability::Stop => CapabilitySet::STOP,
        }
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CapabilitySet::empty(), |set, c| set | c.into())
    }
}

impl CapabilitySet {
    pub fn allows(&self, capability: Capability) -> bool {
        self.contains(capability.into())
    }

    /// Builds a set from configuration names such as `"checkVersion"`.
    /// The single name `"all"` grants everything.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, String> {
        let mut set = CapabilitySet::empty();
        for name in names {
            let name = name.as_ref().trim();
            if name.eq_ignore_ascii_case("all") {
                set |= CapabilitySet::all();
                continue;
            }
            let capability =
                Capability::from_str(name).map_err(|_| format!("unknown capability '{name}'"))?;
            set |= capability.into();
        }
        Ok(set)
    }

    /// The capability names contained in this set, in declaration order.
    pub fn names(&self) -> Vec<String> {
        Capability::iter()
            .filter(|c| self.allows(*c))
            .map(|c| c.to_string())
            .collect()
    }
}
