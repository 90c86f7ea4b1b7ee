use super::lambda::{LambdaError, LambdaSchedule};
use super::quantity::{Energy, ForceConstant};
use super::restraint::{AtomSelection, MorseRestraint};
use phf::{Map, phf_map};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ProtocolError {
    #[error("No restraint protocol is defined for system '{0}'")]
    UnsupportedSystem(String),
    #[error("Protocol '{family}' carries an invalid lambda schedule: {source}")]
    InvalidSchedule {
        family: &'static str,
        #[source]
        source: LambdaError,
    },
}

/// Static description of how a family of perturbations is restrained and sampled.
#[derive(Debug)]
pub struct ProtocolTemplate {
    pub schedule_name: &'static str,
    pub lambda_values: &'static [f64],
    pub selection: &'static str,
    pub basename_modifier: Option<&'static str>,
}

const MORSE_RING_BREAK_MORPH_2: [f64; 23] = [
    0.00, 0.05, 0.10, 0.15, 0.20, 0.25, 0.30, 0.35, 0.40, 0.45, 0.50, 0.55, 0.60, 0.63, 0.65,
    0.66, 0.70, 0.75, 0.80, 0.85, 0.90, 0.95, 1.00,
];

/// Keyed by a substring that must appear in the system name.
static PROTOCOLS: Map<&'static str, ProtocolTemplate> = phf_map! {
    "chk1_compound_20_to_17" => ProtocolTemplate {
        schedule_name: "morse_ring_break_morph_2",
        lambda_values: &MORSE_RING_BREAK_MORPH_2,
        selection: "property is_perturbable and atomidx 22,23,24,25,26,46,47",
        basename_modifier: None,
    },
};

/// The restraint, schedule and selection that apply to one system.
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    pub family: &'static str,
    pub restraint: MorseRestraint,
    pub schedule: LambdaSchedule,
    pub selection: AtomSelection,
    pub basename_modifier: String,
}

/// Finds the template whose family key occurs in `system_name`.
///
/// When several keys match, the longest one wins so that more specific families can
/// shadow broader ones.
pub fn find_template(system_name: &str) -> Option<(&'static str, &'static ProtocolTemplate)> {
    PROTOCOLS
        .entries()
        .filter(|(family, _)| system_name.contains(**family))
        .max_by_key(|(family, _)| family.len())
        .map(|(family, template)| (*family, template))
}

pub fn supported_families() -> Vec<&'static str> {
    let mut families: Vec<_> = PROTOCOLS.keys().copied().collect();
    families.sort_unstable();
    families
}

pub fn resolve(
    system_name: &str,
    force_constant: ForceConstant,
    dissociation_energy: Energy,
) -> Result<Protocol, ProtocolError> {
    let Some((family, template)) = find_template(system_name) else {
        info!(
            "No restraints defined for system '{}'. Supported families: {:?}",
            system_name,
            supported_families()
        );
        return Err(ProtocolError::UnsupportedSystem(system_name.to_string()));
    };

    let restraint = MorseRestraint::auto(force_constant, dissociation_energy);
    debug!("Restraints: {}", restraint);

    let schedule = LambdaSchedule::new(template.schedule_name, template.lambda_values.to_vec())
        .map_err(|source| ProtocolError::InvalidSchedule { family, source })?;

    Ok(Protocol {
        family,
        restraint,
        schedule,
        selection: AtomSelection::new(template.selection),
        basename_modifier: template.basename_modifier.unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k() -> ForceConstant {
        ForceConstant::kcal_per_mol_per_angstrom2(10.0).unwrap()
    }

    fn de() -> Energy {
        Energy::kcal_per_mol(5.0).unwrap()
    }

    #[test]
    fn resolves_known_family_by_substring() {
        let protocol = resolve("chk1_compound_20_to_17_X", k(), de()).unwrap();
        assert_eq!(protocol.family, "chk1_compound_20_to_17");
        assert_eq!(protocol.schedule.name(), "morse_ring_break_morph_2");
        assert_eq!(
            protocol.selection.as_str(),
            "property is_perturbable and atomidx 22,23,24,25,26,46,47"
        );
        assert_eq!(protocol.basename_modifier, "");
        assert!(protocol.restraint.auto_parametrise);
    }

    #[test]
    fn morph_2_schedule_has_23_ascending_points() {
        let protocol = resolve("chk1_compound_20_to_17", k(), de()).unwrap();
        let values = protocol.schedule.values();
        assert_eq!(values.len(), 23);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[22], 1.0);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert!(values.contains(&0.63) && values.contains(&0.66));
    }

    #[test]
    fn unknown_family_is_refused() {
        assert_eq!(
            resolve("tyk2_ejm_31_to_ejm_42", k(), de()),
            Err(ProtocolError::UnsupportedSystem(
                "tyk2_ejm_31_to_ejm_42".to_string()
            ))
        );
        assert!(find_template("chk1_compound_17_to_20").is_none());
    }

    #[test]
    fn supported_families_are_listed() {
        assert_eq!(supported_families(), vec!["chk1_compound_20_to_17"]);
    }
}
