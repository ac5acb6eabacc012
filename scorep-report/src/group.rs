//! The coarse region-classification buckets used for reporting and
//! filtering, grounded on `SCOREP_Score_Types.hpp`'s `SCOREP_SCORE_TYPES`
//! macro. Declaration order here *is* the "ordscore" ranking spec.md's
//! COM-taint rule depends on (see [`Group::taints_usr_ancestor`]):
//! `All < Flt < Usr < Scorep < Com < Mpi < Omp < Shmem < Pthread < Cuda
//! < Opencl < Openacc < Memory < Io < Kokkos < Hip < Lib < Unknown` — every
//! type ranked after COM taints a USR ancestor it's called from; SCOREP
//! ranks *below* COM and does not taint, UNKNOWN ranks above everything
//! and always taints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    All,
    Flt,
    Usr,
    Scorep,
    Com,
    Mpi,
    Omp,
    Shmem,
    Pthread,
    Cuda,
    Opencl,
    Openacc,
    Memory,
    Io,
    Kokkos,
    Hip,
    Lib,
    Unknown,
}

impl Group {
    /// Every non-ALL group, in a fixed, stable order (used to build one
    /// score-group accumulator per bucket, and for `groups[ALL] == sum of
    /// the rest`).
    pub const ALL_BUT_ALL: [Group; 17] = [
        Group::Flt,
        Group::Usr,
        Group::Scorep,
        Group::Com,
        Group::Mpi,
        Group::Omp,
        Group::Shmem,
        Group::Pthread,
        Group::Cuda,
        Group::Opencl,
        Group::Openacc,
        Group::Memory,
        Group::Io,
        Group::Kokkos,
        Group::Hip,
        Group::Lib,
        Group::Unknown,
    ];

    /// `true` if a descendant of this group along a call path reclassifies
    /// a USR ancestor as COM (spec.md §3/§4.2's `calculate_calltree_types`):
    /// any group ranked above COM in declaration order.
    pub fn taints_usr_ancestor(self) -> bool {
        self > Group::Com
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Group::Unknown => "UNKNOWN",
            Group::All => "ALL",
            Group::Flt => "FLT",
            Group::Usr => "USR",
            Group::Com => "COM",
            Group::Scorep => "SCOREP",
            Group::Mpi => "MPI",
            Group::Omp => "OMP",
            Group::Shmem => "SHMEM",
            Group::Pthread => "PTHREAD",
            Group::Cuda => "CUDA",
            Group::Opencl => "OPENCL",
            Group::Openacc => "OPENACC",
            Group::Memory => "MEMORY",
            Group::Io => "IO",
            Group::Kokkos => "KOKKOS",
            Group::Hip => "HIP",
            Group::Lib => "LIB",
        }
    }
}

/// Per-group filter posture, drives whether the filter engine (4.6) is even
/// allowed to consider a region of that group. Table transcribed verbatim
/// from `SCOREP_Score_Types.hpp`'s `SCOREP_SCORE_TYPES` macro: `SCOREP`,
/// the MPI/OpenMP/SHMEM/pthread/OpenCL/OpenACC/memory/IO paradigms, and
/// `UNKNOWN` are never user-filterable (required for correctness of
/// collective/sync overhead accounting); `FLT` is always filtered;
/// everything else is merely possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPosture {
    Yes,
    No,
    Possible,
}

pub fn default_posture(group: Group) -> FilterPosture {
    match group {
        Group::Flt => FilterPosture::Yes,
        Group::Scorep
        | Group::Mpi
        | Group::Omp
        | Group::Shmem
        | Group::Pthread
        | Group::Opencl
        | Group::Openacc
        | Group::Memory
        | Group::Io
        | Group::Unknown => FilterPosture::No,
        Group::All | Group::Usr | Group::Com | Group::Cuda | Group::Kokkos | Group::Hip | Group::Lib => {
            FilterPosture::Possible
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_matches_declaration() {
        assert!(Group::Usr < Group::Scorep);
        assert!(Group::Scorep < Group::Com);
        assert!(Group::Com < Group::Mpi);
        assert!(Group::Lib < Group::Unknown);
        assert!(!Group::Com.taints_usr_ancestor());
        assert!(Group::Mpi.taints_usr_ancestor());
        assert!(!Group::Scorep.taints_usr_ancestor());
        assert!(Group::Unknown.taints_usr_ancestor());
        assert!(!Group::Usr.taints_usr_ancestor());
        assert!(!Group::Flt.taints_usr_ancestor());
    }

    #[test]
    fn filter_posture_matches_original_table() {
        assert_eq!(default_posture(Group::Flt), FilterPosture::Yes);
        assert_eq!(default_posture(Group::Scorep), FilterPosture::No);
        assert_eq!(default_posture(Group::Mpi), FilterPosture::No);
        assert_eq!(default_posture(Group::Omp), FilterPosture::No);
        assert_eq!(default_posture(Group::Shmem), FilterPosture::No);
        assert_eq!(default_posture(Group::Pthread), FilterPosture::No);
        assert_eq!(default_posture(Group::Opencl), FilterPosture::No);
        assert_eq!(default_posture(Group::Openacc), FilterPosture::No);
        assert_eq!(default_posture(Group::Memory), FilterPosture::No);
        assert_eq!(default_posture(Group::Io), FilterPosture::No);
        assert_eq!(default_posture(Group::Unknown), FilterPosture::No);
        assert_eq!(default_posture(Group::All), FilterPosture::Possible);
        assert_eq!(default_posture(Group::Usr), FilterPosture::Possible);
        assert_eq!(default_posture(Group::Com), FilterPosture::Possible);
        assert_eq!(default_posture(Group::Cuda), FilterPosture::Possible);
        assert_eq!(default_posture(Group::Kokkos), FilterPosture::Possible);
        assert_eq!(default_posture(Group::Hip), FilterPosture::Possible);
        assert_eq!(default_posture(Group::Lib), FilterPosture::Possible);
    }
}
