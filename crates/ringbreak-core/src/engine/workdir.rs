use super::params::{SamplingMode, ValidatedRun};
use crate::core::protocol::Protocol;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Topology files the engine writes, and the names downstream analysis expects.
pub const TOPOLOGY_RENAMES: [(&str, &str); 2] = [
    ("system0.prm7", "system0.parm7"),
    ("system1.prm7", "system1.parm7"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryCategory {
    Standard,
    ReplicaExchange,
    Rest2,
}

impl DirectoryCategory {
    pub fn for_sampling(sampling: &SamplingMode) -> Self {
        match sampling {
            SamplingMode::Independent => DirectoryCategory::Standard,
            SamplingMode::ReplicaExchange => DirectoryCategory::ReplicaExchange,
            SamplingMode::ReplicaExchangeRest2 { .. } => DirectoryCategory::Rest2,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            DirectoryCategory::Standard => "dynamics_std",
            DirectoryCategory::ReplicaExchange => "dynamics_hrex",
            DirectoryCategory::Rest2 => "dynamics_rest2",
        }
    }
}

/// What [`RunWorkDirectory::prepare`] found and did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryState {
    Created,
    Cleaned,
    Preserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyCopyStatus {
    Copied,
    Missing,
}

/// Output location of one replicate: `<root>/<prefix>/<basename>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunWorkDirectory {
    category: DirectoryCategory,
    basename: String,
    path: PathBuf,
}

pub fn basename(
    system_name: &str,
    ghost_mods: bool,
    restraints_strength: &str,
    bond_strength: f64,
    modifier: &str,
    replicate: u32,
) -> String {
    let ghost_tag = if ghost_mods { "ghost_mods" } else { "no_ghosts" };
    // Truncation toward zero is part of the naming scheme.
    let k = bond_strength.trunc() as i64;
    format!(
        "{system_name}_{ghost_tag}_morse_ring_break_stage_{restraints_strength}_de_{k}_k_morse_potential_restr_{modifier}_repl_{replicate}"
    )
}

impl RunWorkDirectory {
    pub fn derive(root: &Path, run: &ValidatedRun, protocol: &Protocol, replicate: u32) -> Self {
        let category = DirectoryCategory::for_sampling(&run.sampling);
        let basename = basename(
            &run.system_name,
            run.ghost_mods,
            &run.restraints_strength,
            run.bond_strength,
            &protocol.basename_modifier,
            replicate,
        );
        let path = root.join(category.prefix()).join(&basename);
        Self {
            category,
            basename,
            path,
        }
    }

    pub fn category(&self) -> DirectoryCategory {
        self.category
    }

    pub fn basename(&self) -> &str {
        &self.basename
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Makes the directory ready for a run.
    ///
    /// A fresh run always starts from an empty directory; a restart keeps whatever
    /// checkpoint state is already there.
    pub fn prepare(&self, restart: bool) -> io::Result<DirectoryState> {
        if !self.path.exists() {
            fs::create_dir_all(&self.path)?;
            debug!("Created working directory {:?}", &self.path);
            return Ok(DirectoryState::Created);
        }
        if restart {
            info!(
                "Directory {:?} already exists, keeping it for restart.",
                &self.path
            );
            return Ok(DirectoryState::Preserved);
        }
        info!(
            "Directory {:?} already exists, cleaning it before the run.",
            &self.path
        );
        fs::remove_dir_all(&self.path)?;
        fs::create_dir_all(&self.path)?;
        Ok(DirectoryState::Cleaned)
    }

    /// Copies the engine's `.prm7` topologies to their `.parm7` names.
    ///
    /// A missing source is expected when the engine wrote no topology and is reported as
    /// [`TopologyCopyStatus::Missing`]; any other I/O failure is returned.
    pub fn copy_topologies(&self) -> io::Result<TopologyCopyStatus> {
        info!("Copying topology files");
        for (from, to) in TOPOLOGY_RENAMES {
            match fs::copy(self.path.join(from), self.path.join(to)) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    info!("Could not find the topology files to copy");
                    return Ok(TopologyCopyStatus::Missing);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(TopologyCopyStatus::Copied)
    }
}
