//! The fixed event contributor catalogue (spec.md §4.4), grounded verbatim
//! on `SCOREP_Score_Estimator`'s `registerEvent` sequence and the
//! `SCOREP_Score_EventList.hpp` name tables (read in full; see
//! SPEC_FULL.md §4.4). Each [`Contributor`] knows its own wire-event name,
//! whether it carries a timestamp, and the predicate that decides whether a
//! given region triggers it; [`Catalogue::bytes_per_visit`] sums the sizes
//! of every contributor that fires for a region.
use rustc_hash::FxHashSet;
use scorep_oracle::EventSizeOracle;
use scorep_report::{Paradigm, Profile, Region, RegionId};

use crate::error::EstimatorError;

/// One registered event contributor. Mirrors the `SCOREP_Score_*Event`
/// class hierarchy as a closed set of variants (the "virtual-method
/// hierarchy -> tagged union" rearchitecture from spec.md §9) instead of a
/// `SCOREP_Score_Event*` vtable.
enum Contributor {
    Enter,
    Leave,
    CallingContextEnter,
    CallingContextLeave,
    CallingContextSample,
    ProgramBegin,
    ProgramEnd,
    Metric { num_dense: u64 },
    NameMatch {
        event: &'static str,
        names: FxHashSet<&'static str>,
        has_timestamp: bool,
    },
    PrefixMatch {
        event: &'static str,
        prefixes: Vec<&'static str>,
        has_timestamp: bool,
    },
}

impl Contributor {
    fn event_name(&self) -> &str {
        match self {
            Contributor::Enter => "Enter",
            Contributor::Leave => "Leave",
            Contributor::CallingContextEnter => "CallingContextEnter",
            Contributor::CallingContextLeave => "CallingContextLeave",
            Contributor::CallingContextSample => "CallingContextSample",
            Contributor::ProgramBegin => "ProgramBegin",
            Contributor::ProgramEnd => "ProgramEnd",
            Contributor::Metric { .. } => "Metric",
            Contributor::NameMatch { event, .. } => event,
            Contributor::PrefixMatch { event, .. } => event,
        }
    }

    fn has_timestamp(&self) -> bool {
        match self {
            Contributor::Enter | Contributor::Leave => true,
            Contributor::CallingContextEnter | Contributor::CallingContextLeave => true,
            Contributor::CallingContextSample => false,
            Contributor::ProgramBegin | Contributor::ProgramEnd => true,
            Contributor::Metric { .. } => false,
            Contributor::NameMatch { has_timestamp, .. } => *has_timestamp,
            Contributor::PrefixMatch { has_timestamp, .. } => *has_timestamp,
        }
    }

    /// Size contributed per firing: the event's own (possibly doubled, for
    /// `Metric`) size plus a timestamp when `has_timestamp()`.
    fn size(&self, oracle: &EventSizeOracle, timestamp_size: u64) -> Result<u64, EstimatorError> {
        let base = match self {
            Contributor::Metric { .. } => 2 * oracle.size_of("Metric")?,
            other => oracle.size_of(other.event_name())?,
        };
        Ok(base + if self.has_timestamp() { timestamp_size } else { 0 })
    }

    fn contributes(&self, profile: &Profile, region: &Region, region_id: RegionId) -> bool {
        match self {
            Contributor::Enter | Contributor::Leave => {
                !profile.has_hits() && !region.omit_in_trace_enter_leave_events()
            }
            Contributor::CallingContextEnter
            | Contributor::CallingContextLeave
            | Contributor::CallingContextSample => profile.has_hits() && !region.is_dynamic(),
            Contributor::ProgramBegin | Contributor::ProgramEnd => {
                region.is_program_root
                    && !matches!(region.paradigm(), Paradigm::Cuda | Paradigm::Opencl)
            }
            Contributor::Metric { .. } => !region.is_dynamic(),
            Contributor::NameMatch { names, .. } => names.contains(region.name.as_str()),
            Contributor::PrefixMatch { prefixes, .. } => {
                prefixes.iter().any(|p| region.name.starts_with(p))
            }
        }
        // region_id is accepted (not just `region`) to mirror
        // `contributes(profile, regionId)`'s signature from spec.md §4.4;
        // every predicate above only needs the resolved `Region`.
        && { let _ = region_id; true }
    }
}

/// The populated catalogue: one entry per registered contributor, plus the
/// resolved per-contributor byte size, ready for `bytes_per_visit`.
pub struct Catalogue {
    contributors: Vec<(Contributor, u64)>,
    timestamp_size: u64,
}

impl Catalogue {
    /// Registers the full fixed set (spec.md §4.4, enumerated concretely in
    /// SPEC_FULL.md §4.4) and resolves every contributor's size from
    /// `oracle`. `num_dense` is the count of hardware-counter metrics
    /// (`-c` on the CLI); `has_program_args` mirrors
    /// `profile->getNumberOfProgramArguments() >= 0`.
    pub fn build(
        oracle: &EventSizeOracle,
        profile: &Profile,
        num_dense: u64,
    ) -> Result<Catalogue, EstimatorError> {
        let timestamp_size = oracle.size_of("Timestamp")?;
        let mut entries: Vec<Contributor> = vec![Contributor::Enter, Contributor::Leave];
        if profile.has_hits() {
            entries.push(Contributor::CallingContextEnter);
            entries.push(Contributor::CallingContextLeave);
            entries.push(Contributor::CallingContextSample);
        }
        if num_dense > 0 {
            entries.push(Contributor::Metric { num_dense });
        }
        if profile.number_of_program_arguments() >= 0 {
            entries.push(Contributor::ProgramBegin);
            entries.push(Contributor::ProgramEnd);
        }
        entries.extend(name_match_table());
        entries.extend(prefix_match_table());

        let mut contributors = Vec::with_capacity(entries.len());
        for c in entries {
            let size = c.size(oracle, timestamp_size)?;
            contributors.push((c, size));
        }
        Ok(Catalogue {
            contributors,
            timestamp_size,
        })
    }

    pub fn timestamp_size(&self) -> u64 {
        self.timestamp_size
    }

    /// `bytesPerVisit(r)` from spec.md §4.4: the sum over every contributor
    /// that fires for `r`, zero for `sampling`-paradigm regions (their
    /// visits never reach the trace).
    pub fn bytes_per_visit(&self, profile: &Profile, region_id: RegionId) -> Result<u64, EstimatorError> {
        let region = profile.region(region_id)?;
        if matches!(region.paradigm(), Paradigm::Sampling) {
            return Ok(0);
        }
        let mut total = 0u64;
        for (c, size) in &self.contributors {
            if c.contributes(profile, region, region_id) {
                total += size;
            }
        }
        Ok(total)
    }
}

fn name_match_table() -> Vec<Contributor> {
    macro_rules! name_set {
        ($($name:literal),* $(,)?) => {{
            let mut s: FxHashSet<&'static str> = FxHashSet::default();
            $(s.insert($name);)*
            s
        }};
    }

    let mpi_send = name_set![
        "MPI_Bsend", "MPI_Rsend", "MPI_Ssend", "MPI_Sendrecv", "MPI_Sendrecv_replace", "MPI_Send"
    ];
    let mpi_isend = name_set![
        "MPI_Ibsend", "MPI_Irsend", "MPI_Issend", "MPI_Isend", "MPI_Bsend_init", "MPI_Rsend_init",
        "MPI_Send_init", "MPI_Ssend_init"
    ];
    let mpi_irecv_request = name_set!["MPI_Irecv", "MPI_Irecv_init"];
    let mpi_recv = name_set!["MPI_Sendrecv", "MPI_Sendrecv_replace", "MPI_Recv"];
    let mpi_collective = name_set![
        "MPI_Allgather", "MPI_Allgatherv", "MPI_Allreduce", "MPI_Alltoall", "MPI_Alltoallv",
        "MPI_Alltoallw", "MPI_Barrier", "MPI_Bcast", "MPI_Exscan", "MPI_Gather", "MPI_Gatherv",
        "MPI_Reduce", "MPI_Reduce_scatter", "MPI_Reduce_scatter_block", "MPI_Scan", "MPI_Scatter",
        "MPI_Scatterv"
    ];
    let mpi_non_blocking_collective = name_set![
        "MPI_Iallgather", "MPI_Iallgatherv", "MPI_Iallreduce", "MPI_Ialltoall", "MPI_Ialltoallv",
        "MPI_Ialltoallw", "MPI_Ibarrier", "MPI_Ibcast", "MPI_Iexscan", "MPI_Igather",
        "MPI_Igatherv", "MPI_Ireduce", "MPI_Ireduce_scatter", "MPI_Ireduce_scatter_block",
        "MPI_Iscan", "MPI_Iscatter", "MPI_Iscatterv"
    ];
    let thread_acquire_lock = name_set![
        "omp_set_lock", "omp_set_nest_lock", "pthread_mutex_unlock", "pthread_cond_wait",
        "pthread_cond_timedwait"
    ];
    let thread_release_lock = name_set![
        "omp_unset_lock", "omp_unset_nest_lock", "pthread_mutex_unlock", "pthread_cond_wait",
        "pthread_cond_timedwait"
    ];
    let rma_op = name_set![
        "shmem_char_p", "shmem_short_p", "shmem_int_p", "shmem_long_p", "shmem_float_p",
        "shmem_double_p", "shmem_longlong_p", "shmem_longdouble_p", "shmem_char_put",
        "shmem_short_put", "shmem_int_put", "shmem_long_put", "shmem_float_put",
        "shmem_double_put", "shmem_longlong_put", "shmem_longdouble_put", "shmem_putmem",
        "shmem_char_g", "shmem_short_g", "shmem_int_g", "shmem_long_g", "shmem_float_g",
        "shmem_double_g", "shmem_longlong_g", "shmem_longdouble_g", "shmem_char_get",
        "shmem_short_get", "shmem_int_get", "shmem_long_get", "shmem_float_get",
        "shmem_double_get", "shmem_longlong_get", "shmem_longdouble_get", "shmem_getmem",
        "hipMemcpy", "hipMemcpyWithStream", "hipMemcpyHtoD", "hipMemcpyFromSymbol",
        "hipMemcpyDtoH", "hipMemcpyDtoD", "hipMemcpyAsync", "hipMemcpyHtoDAsync",
        "hipMemcpyFromSymbolAsync", "hipMemcpyDtoHAsync", "hipMemcpyDtoDAsync"
    ];
    let rma_op_complete_remote = name_set!["shmem_barrier_all"];
    let rma_atomic = name_set![
        "shmem_short_swap", "shmem_int_swap", "shmem_long_swap", "shmem_swap",
        "shmem_longlong_swap", "shmem_float_swap", "shmem_double_swap", "shmem_short_cswap",
        "shmem_int_cswap", "shmem_long_cswap", "shmem_longlong_cswap", "shmem_short_fadd",
        "shmem_int_fadd", "shmem_long_fadd", "shmem_longlong_fadd", "shmem_short_finc",
        "shmem_int_finc", "shmem_long_finc", "shmem_longlong_finc", "shmem_short_add",
        "shmem_int_add", "shmem_long_add", "shmem_longlong_add", "shmem_short_inc",
        "shmem_int_inc", "shmem_long_inc", "shmem_longlong_inc"
    ];
    let rma_collective = name_set![
        "shmem_barrier_all", "shmem_barrier", "shmem_broadcast32", "shmem_broadcast64",
        "shmem_collect32", "shmem_collect64", "shmem_fcollect32", "shmem_fcollect64"
    ];
    let rma_wait_change = name_set![
        "shmem_short_wait", "shmem_int_wait", "shmem_long_wait", "shmem_longlong_wait",
        "shmem_wait", "shmem_short_wait_until", "shmem_int_wait_until", "shmem_long_wait_until",
        "shmem_longlong_wait_until", "shmem_wait_until"
    ];
    let rma_lock = name_set!["shmem_set_lock", "shmem_test_lock"];
    let rma_release_lock = name_set!["shmem_clear_lock"];

    let io_create = name_set![
        "MPI_File_open", "creat", "creat64", "open", "open64", "openat", "fdopen", "fopen",
        "fopen64", "freopen"
    ];
    let io_delete = name_set!["MPI_File_close", "MPI_File_delete", "unlink", "unlinkat"];
    let io_seek = name_set![
        "MPI_File_seek", "MPI_File_seek_shared", "lseek", "lseek64", "fseek", "fseeko",
        "fseeko64", "fsetpos", "rewind"
    ];
    let io_blocking_transfer = name_set![
        "MPI_File_read", "MPI_File_read_all", "MPI_File_read_at", "MPI_File_read_at_all",
        "MPI_File_read_ordered", "MPI_File_read_shared", "MPI_File_write", "MPI_File_write_all",
        "MPI_File_write_at", "MPI_File_write_at_all", "MPI_File_write_ordered",
        "MPI_File_write_shared", "fdatasync", "fsync", "pread", "pread64", "pwrite", "pwrite64",
        "read", "syncfs", "write", "preadv", "pwritev", "readv", "writev", "lio_listio",
        "fflush", "fgetc", "fgets", "fputc", "fprintf", "fputs", "fread", "fscanf", "fwrite",
        "getc", "getchar", "gets", "printf", "putchar", "puts", "scanf", "vfprintf", "vfscanf",
        "vscanf", "vprintf"
    ];
    let io_nonblocking_begin = name_set![
        "MPI_File_iread", "MPI_File_iread_all", "MPI_File_iread_at", "MPI_File_iread_at_all",
        "MPI_File_iread_shared", "MPI_File_iwrite", "MPI_File_iwrite_all", "MPI_File_iwrite_at",
        "MPI_File_iwrite_at_all", "MPI_File_iwrite_shared", "MPI_File_read_all_begin",
        "MPI_File_read_at_all_begin", "MPI_File_read_ordered_begin", "MPI_File_write_all_begin",
        "MPI_File_write_at_all_begin", "MPI_File_write_ordered_begin", "sync", "aio_read",
        "aio_write"
    ];
    let io_nonblocking_end = name_set![
        "MPI_File_read_all_end", "MPI_File_read_at_all_end", "MPI_File_read_ordered_end",
        "MPI_File_write_all_end", "MPI_File_write_at_all_end", "MPI_File_write_ordered_end",
        "sync", "aio_error", "aio_return"
    ];
    let io_close = name_set!["close", "closedir", "fclose"];
    let io_duplicate = name_set!["dup", "dup2", "dup3", "fcntl"];
    let io_acquire_lock = name_set!["lockf", "flockfile", "ftrylockfile"];
    let io_operation_cancelled = name_set!["aio_cancel"];
    let io_release_lock = name_set!["funlockfile"];

    vec![
        Contributor::NameMatch { event: "MpiSend", names: mpi_send, has_timestamp: true },
        Contributor::NameMatch { event: "MpiIsend", names: mpi_isend.clone(), has_timestamp: true },
        Contributor::NameMatch { event: "MpiIsendComplete", names: mpi_isend, has_timestamp: true },
        Contributor::NameMatch {
            event: "MpiIrecvRequest",
            names: mpi_irecv_request.clone(),
            has_timestamp: true,
        },
        Contributor::NameMatch { event: "MpiRecv", names: mpi_recv, has_timestamp: true },
        Contributor::NameMatch { event: "MpiIrecv", names: mpi_irecv_request, has_timestamp: true },
        Contributor::NameMatch {
            event: "MpiCollectiveBegin",
            names: mpi_collective.clone(),
            has_timestamp: false,
        },
        Contributor::NameMatch {
            event: "MpiCollectiveEnd",
            names: mpi_collective,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "NonBlockingCollectiveRequest",
            names: mpi_non_blocking_collective.clone(),
            has_timestamp: false,
        },
        Contributor::NameMatch {
            event: "NonBlockingCollectiveComplete",
            names: mpi_non_blocking_collective,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "ThreadAcquireLock",
            names: thread_acquire_lock,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "ThreadReleaseLock",
            names: thread_release_lock,
            has_timestamp: true,
        },
        Contributor::NameMatch { event: "RmaPut", names: rma_op.clone(), has_timestamp: true },
        Contributor::NameMatch {
            event: "RmaOpCompleteBlocking",
            names: rma_op,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "RmaOpCompleteRemote",
            names: rma_op_complete_remote,
            has_timestamp: true,
        },
        Contributor::NameMatch { event: "RmaAtomic", names: rma_atomic.clone(), has_timestamp: false },
        Contributor::NameMatch {
            event: "RmaOpCompleteBlocking",
            names: rma_atomic,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "RmaCollectiveBegin",
            names: rma_collective.clone(),
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "RmaCollectiveEnd",
            names: rma_collective,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "RmaWaitChange",
            names: rma_wait_change,
            has_timestamp: false,
        },
        Contributor::NameMatch { event: "RmaRequestLock", names: rma_lock, has_timestamp: false },
        Contributor::NameMatch {
            event: "RmaReleaseLock",
            names: rma_release_lock,
            has_timestamp: false,
        },
        Contributor::NameMatch {
            event: "IoDestroyHandle",
            names: io_create.clone(),
            has_timestamp: true,
        },
        Contributor::NameMatch { event: "IoCreateHandle", names: io_create, has_timestamp: true },
        Contributor::NameMatch {
            event: "IoDestroyHandle",
            names: io_delete.clone(),
            has_timestamp: true,
        },
        Contributor::NameMatch { event: "IoDeleteFile", names: io_delete, has_timestamp: true },
        Contributor::NameMatch { event: "IoSeek", names: io_seek, has_timestamp: true },
        Contributor::NameMatch {
            event: "IoOperationComplete",
            names: io_blocking_transfer.clone(),
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoOperationBegin",
            names: io_blocking_transfer,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoOperationIssued",
            names: io_nonblocking_begin.clone(),
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoOperationBegin",
            names: io_nonblocking_begin,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoOperationComplete",
            names: io_nonblocking_end.clone(),
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoOperationTest",
            names: io_nonblocking_end,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoDestroyHandle",
            names: io_close,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoDuplicateHandle",
            names: io_duplicate.clone(),
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoDestroyHandle",
            names: io_duplicate,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoTryLock",
            names: io_acquire_lock.clone(),
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoAcquireLock",
            names: io_acquire_lock,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoOperationCancelled",
            names: io_operation_cancelled,
            has_timestamp: true,
        },
        Contributor::NameMatch {
            event: "IoReleaseLock",
            names: io_release_lock,
            has_timestamp: true,
        },
    ]
}

fn prefix_match_table() -> Vec<Contributor> {
    vec![
        Contributor::PrefixMatch {
            event: "ThreadFork",
            prefixes: vec!["!$omp parallel"],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "ThreadJoin",
            prefixes: vec!["!$omp parallel"],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "ThreadTeamBegin",
            prefixes: vec!["!$omp parallel"],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "ThreadTeamEnd",
            prefixes: vec!["!$omp parallel"],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "ThreadTaskCreate",
            prefixes: vec!["!$omp task "],
            has_timestamp: false,
        },
        Contributor::PrefixMatch {
            event: "ThreadTaskComplete",
            prefixes: vec!["!$omp task "],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "ThreadTaskSwitch",
            prefixes: vec!["!$omp task"],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "ThreadCreate",
            prefixes: vec!["pthread_create"],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "ThreadBegin",
            prefixes: vec!["pthread_create"],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "ThreadWait",
            prefixes: vec!["pthread_join"],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "ThreadEnd",
            prefixes: vec!["pthread_create"],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "BufferFlush",
            prefixes: vec!["TRACE BUFFER FLUSH"],
            has_timestamp: true,
        },
        Contributor::PrefixMatch {
            event: "MeasurementOnOff",
            prefixes: vec!["MEASUREMENT OFF"],
            has_timestamp: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorep_oracle::EventSizeOracle;
    use scorep_report::{CallNode, CnodeId, Profile, RawReport, Region, RegionId};

    fn oracle() -> EventSizeOracle {
        EventSizeOracle::from_table([
            ("Timestamp".to_string(), 8u64),
            ("Enter".to_string(), 60u64),
            ("Leave".to_string(), 60u64),
            ("ParameterInt".to_string(), 12u64),
            ("ParameterString".to_string(), 12u64),
            ("CallingContextSample".to_string(), 20u64),
            ("CallingContextEnter".to_string(), 40u64),
            ("CallingContextLeave".to_string(), 10u64),
            ("Metric".to_string(), 16u64),
            ("MpiSend".to_string(), 30u64),
        ])
    }

    fn build_profile(region: Region) -> Profile {
        let mut raw = RawReport::new();
        raw.regions.push(region);
        raw.cnodes.push(CallNode {
            region: RegionId(0),
            parent: None,
            children: vec![],
            num_params_int: 0,
            num_params_str: 0,
        });
        raw.root_cnodes.push(CnodeId(0));
        Profile::build(raw).unwrap()
    }

    #[test]
    fn enter_leave_plus_timestamp_for_plain_user_region() {
        let region = Region {
            name: "foo".to_string(),
            mangled_name: "foo".to_string(),
            paradigm_tag: "user".to_string(),
            ..Default::default()
        };
        let profile = build_profile(region);
        let oracle = oracle();
        let catalogue = Catalogue::build(&oracle, &profile, 0).unwrap();
        assert_eq!(catalogue.bytes_per_visit(&profile, RegionId(0)).unwrap(), 136);
    }

    #[test]
    fn sampling_region_contributes_nothing() {
        let region = Region {
            name: "S".to_string(),
            mangled_name: "S".to_string(),
            paradigm_tag: "sampling".to_string(),
            ..Default::default()
        };
        let profile = build_profile(region);
        let oracle = oracle();
        let catalogue = Catalogue::build(&oracle, &profile, 0).unwrap();
        assert_eq!(catalogue.bytes_per_visit(&profile, RegionId(0)).unwrap(), 0);
    }

    #[test]
    fn mpi_send_name_match_contributes() {
        let region = Region {
            name: "MPI_Send".to_string(),
            mangled_name: "MPI_Send".to_string(),
            paradigm_tag: "mpi".to_string(),
            ..Default::default()
        };
        let profile = build_profile(region);
        let oracle = oracle();
        let catalogue = Catalogue::build(&oracle, &profile, 0).unwrap();
        // Enter + Leave + Timestamp*2 + MpiSend + Timestamp.
        assert_eq!(
            catalogue.bytes_per_visit(&profile, RegionId(0)).unwrap(),
            60 + 8 + 60 + 8 + 30 + 8
        );
    }
}
