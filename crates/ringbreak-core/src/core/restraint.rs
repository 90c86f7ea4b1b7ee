use super::quantity::{Energy, ForceConstant};
use serde::Serialize;
use std::fmt;

/// A selection expression understood by the molecular toolkit, e.g.
/// `property is_perturbable and atomidx 22,23`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AtomSelection(String);

impl AtomSelection {
    pub fn new(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AtomSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request for a Morse-potential bond restraint.
///
/// The restraint itself is evaluated by the simulation engine; this value only carries
/// the parameters needed to construct it. When `auto_parametrise` is set and no atoms
/// are given, the engine infers the restrained bond from the perturbation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MorseRestraint {
    #[serde(rename = "k")]
    pub force_constant: ForceConstant,
    #[serde(rename = "de")]
    pub dissociation_energy: Energy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atoms: Option<AtomSelection>,
    pub auto_parametrise: bool,
}

impl MorseRestraint {
    pub fn auto(force_constant: ForceConstant, dissociation_energy: Energy) -> Self {
        Self {
            force_constant,
            dissociation_energy,
            atoms: None,
            auto_parametrise: true,
        }
    }
}

impl fmt::Display for MorseRestraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MorseRestraint(k={}, de={}, atoms={}, auto_parametrise={})",
            self.force_constant,
            self.dissociation_energy,
            self.atoms.as_ref().map_or("auto", AtomSelection::as_str),
            self.auto_parametrise
        )
    }
}
