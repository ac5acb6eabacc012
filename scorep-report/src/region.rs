//! Region table: one entry per measured source-level unit, grounded on
//! `SCOREP_Score_Profile::get_definition_type` (paradigm → group derivation,
//! including the name-prefix sniffing fallback) and `cube::Region`'s
//! name/mangled-name/file/paradigm accessors.
use crate::group::Group;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u32);

/// The measurement source that named a region. `LibWrap` and `Hip` carry
/// the raw paradigm suffix after `libwrap:`/`hip:` since those two
/// paradigms are themselves families (one per wrapped library).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paradigm {
    Mpi,
    Shmem,
    Openmp,
    Pthread,
    Cuda,
    Opencl,
    Openacc,
    Memory,
    Measurement,
    Io,
    Hip,
    Kokkos,
    LibWrap(String),
    User,
    Sampling,
    Unknown,
}

impl Paradigm {
    /// Parse the raw paradigm tag a report model carries. `description` is
    /// consulted only when `tag` is literally `"unknown"`, matching
    /// `regionParadigm(r)`'s documented fallback (spec.md §4.2).
    pub fn parse(tag: &str, description: &str) -> Paradigm {
        let tag = if tag.eq_ignore_ascii_case("unknown") && !description.is_empty() {
            description
        } else {
            tag
        };
        match tag {
            "mpi" => Paradigm::Mpi,
            "shmem" => Paradigm::Shmem,
            "openmp" => Paradigm::Openmp,
            "pthread" => Paradigm::Pthread,
            "cuda" => Paradigm::Cuda,
            "opencl" => Paradigm::Opencl,
            "openacc" => Paradigm::Openacc,
            "memory" => Paradigm::Memory,
            "measurement" => Paradigm::Measurement,
            "io" => Paradigm::Io,
            "hip" => Paradigm::Hip,
            "kokkos" => Paradigm::Kokkos,
            "user" => Paradigm::User,
            "sampling" => Paradigm::Sampling,
            other if other.starts_with("libwrap:") => {
                Paradigm::LibWrap(other["libwrap:".len()..].to_string())
            }
            other if other.starts_with("hip:") => Paradigm::Hip,
            _ => Paradigm::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Region {
    pub name: String,
    pub mangled_name: String,
    pub file: String,
    pub paradigm_tag: String,
    pub description: String,
    /// The call-tree root region for this process (there is exactly one
    /// per report in well-formed input); produces no enter/leave event.
    pub is_program_root: bool,
    /// Per-region Cube attributes, e.g.
    /// `Score-P::ProgramArguments::numberOfArguments` (spec.md §4.2 [FULL]
    /// supplement).
    pub attributes: std::collections::HashMap<String, String>,
}

impl Region {
    pub fn paradigm(&self) -> Paradigm {
        Paradigm::parse(&self.paradigm_tag, &self.description)
    }

    /// `MEASUREMENT OFF`, `instance=*`, `iteration=*` — spec.md §4.2's
    /// special "user" region names that are dynamic and/or omitted from
    /// enter/leave regardless of paradigm.
    pub fn is_measurement_on_off(&self) -> bool {
        self.name == "MEASUREMENT OFF"
    }

    pub fn is_dynamic(&self) -> bool {
        self.name.starts_with("instance=") || self.name.starts_with("iteration=")
    }

    pub fn omit_in_trace_enter_leave_events(&self) -> bool {
        self.is_program_root || self.is_dynamic() || self.is_measurement_on_off()
    }
}

/// Base group derivation from paradigm plus the name-prefix rules used only
/// when the paradigm itself is [`Paradigm::Unknown`] — grounded verbatim on
/// `get_definition_type`'s fallback chain. This is the *static* group; call
/// `Profile::group` for the COM-tainted group actually used by the
/// estimator and reports.
pub fn derive_base_group(region: &Region) -> Group {
    match region.paradigm() {
        Paradigm::Mpi => Group::Mpi,
        Paradigm::Shmem => Group::Shmem,
        Paradigm::Openmp => Group::Omp,
        Paradigm::Pthread => Group::Pthread,
        Paradigm::Cuda => Group::Cuda,
        Paradigm::Opencl => Group::Opencl,
        Paradigm::Openacc => Group::Openacc,
        Paradigm::Memory => Group::Memory,
        Paradigm::Measurement => Group::Scorep,
        Paradigm::Io => Group::Io,
        Paradigm::Hip => Group::Hip,
        Paradigm::Kokkos => Group::Kokkos,
        Paradigm::LibWrap(_) => Group::Lib,
        Paradigm::Sampling => Group::Usr,
        Paradigm::User => Group::Usr,
        Paradigm::Unknown => derive_from_name_prefix(&region.name),
    }
}

fn derive_from_name_prefix(name: &str) -> Group {
    if name.starts_with("MPI_") {
        Group::Mpi
    } else if name.starts_with("shmem_") {
        Group::Shmem
    } else if name.starts_with("!$omp ") || name.starts_with("omp_") {
        Group::Omp
    } else if name.starts_with("pthread_") {
        Group::Pthread
    } else if starts_with_then_uppercase(name, "cu") || starts_with_then_uppercase(name, "cuda") {
        Group::Cuda
    } else if starts_with_then_uppercase(name, "cl") {
        Group::Opencl
    } else {
        Group::Usr
    }
}

fn starts_with_then_uppercase(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(name: &str, paradigm_tag: &str) -> Region {
        Region {
            name: name.to_string(),
            mangled_name: name.to_string(),
            paradigm_tag: paradigm_tag.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn direct_paradigm_tags_map_to_groups() {
        assert_eq!(derive_base_group(&region("MPI_Send", "mpi")), Group::Mpi);
        assert_eq!(derive_base_group(&region("foo", "user")), Group::Usr);
        assert_eq!(
            derive_base_group(&region("libwrap_foo", "libwrap:zlib")),
            Group::Lib
        );
    }

    #[test]
    fn unknown_paradigm_falls_back_to_name_prefix() {
        assert_eq!(derive_base_group(&region("MPI_Barrier", "unknown")), Group::Mpi);
        assert_eq!(derive_base_group(&region("shmem_put", "unknown")), Group::Shmem);
        assert_eq!(derive_base_group(&region("omp_get_thread_num", "unknown")), Group::Omp);
        assert_eq!(derive_base_group(&region("!$omp parallel", "unknown")), Group::Omp);
        assert_eq!(derive_base_group(&region("pthread_create", "unknown")), Group::Pthread);
        assert_eq!(derive_base_group(&region("cuLaunchKernel", "unknown")), Group::Cuda);
        assert_eq!(derive_base_group(&region("cudaMalloc", "unknown")), Group::Cuda);
        assert_eq!(derive_base_group(&region("clEnqueueTask", "unknown")), Group::Opencl);
        assert_eq!(derive_base_group(&region("my_function", "unknown")), Group::Usr);
    }

    #[test]
    fn paradigm_falls_back_to_description_when_tag_is_unknown() {
        let r = region("f", "unknown");
        let mut r = r;
        r.description = "mpi".to_string();
        assert_eq!(r.paradigm(), Paradigm::Mpi);
    }

    #[test]
    fn dynamic_and_root_regions_omit_enter_leave() {
        let mut r = region("iteration=1", "user");
        assert!(r.is_dynamic());
        assert!(r.omit_in_trace_enter_leave_events());
        r = region("MEASUREMENT OFF", "measurement");
        assert!(r.is_measurement_on_off());
        assert!(r.omit_in_trace_enter_leave_events());
    }
}
