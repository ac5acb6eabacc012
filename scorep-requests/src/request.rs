//! The request catalogue itself (spec.md §4.8): one variant per request,
//! each with its payload schema and its server-side action. Wire encoding
//! here is payload-only — framing (marker/request-id/sequence/body-length)
//! is the connection layer's job, matching spec.md §4.7's division between
//! "receiveRequestPayload" (this module) and the header read (§4.9).
use log::warn;
use scorep_report::{CnodeId, CubePlExpressions, Metric, MetricId, MetricKind, Profile, RegionId};
use scorep_value::{Value, ValueType};

use scorep_protocol::WireCodec;

use crate::catalogue::RequestId;
use crate::error::RequestError;
use crate::selection::Selection;
use crate::session::CubeSession;
use crate::tree;

pub const LIBRARY_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeSelector {
    Cnode(CnodeId),
    Region(RegionId),
}

#[derive(Debug, Clone)]
pub struct MetricDefinition {
    pub name: String,
    pub display_name: String,
    pub data_type: ValueType,
    pub unit: String,
    pub expressions: CubePlExpressions,
    pub parent: Option<MetricId>,
}

#[derive(Debug, Clone)]
pub enum Request {
    NegotiateProtocol { max_client_version: u32 },
    ClientServerVersion { client_version_string: String },
    Disconnect,
    OpenCube { path: String },
    CloseCube,
    SaveCube { path: String },
    DefineMetric { definition: MetricDefinition },
    MetricTreeValues { selector: TreeSelector, processes: Selection<u32> },
    MetricSubtreeValues { root_metric: MetricId, depth: u32, selector: TreeSelector, processes: Selection<u32> },
    CallpathTreeValues { metrics: Selection<u32>, processes: Selection<u32> },
    CallpathSubtreeValues { root_cnode: CnodeId, depth: u32, metrics: Selection<u32>, processes: Selection<u32> },
    FlatTreeValues { metrics: Selection<u32>, processes: Selection<u32> },
    SystemTreeValues { metrics: Selection<u32>, selector: TreeSelector },
    TreeValue { metric: MetricId, cnode: CnodeId, processes: Selection<u32> },
    MiscData { name: String },
    FileSystem { path: String },
    Version,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    NegotiateProtocol { negotiated_version: u32 },
    ClientServerVersion { server_version_string: String },
    Disconnect,
    OpenCube,
    CloseCube,
    SaveCube,
    DefineMetric { installed: bool },
    TreeValues { inclusive: Vec<Value>, exclusive: Vec<Value> },
    SubtreeValues { inclusive: Vec<Value>, exclusive: Vec<Value>, index_to_id: Vec<u32> },
    FlatTreeValues { inclusive: Vec<Value>, exclusive: Vec<Value>, difference: Vec<Value> },
    TreeValue { value: Value },
    MiscData { bytes: Vec<u8> },
    FileSystem { entries: Vec<FileSystemEntry> },
    Version { version: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileSystemEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    pub mtime: u64,
}

impl Request {
    pub fn id(&self) -> RequestId {
        match self {
            Request::NegotiateProtocol { .. } => RequestId::NegotiateProtocol,
            Request::ClientServerVersion { .. } => RequestId::ClientServerVersion,
            Request::Disconnect => RequestId::Disconnect,
            Request::OpenCube { .. } => RequestId::OpenCube,
            Request::CloseCube => RequestId::CloseCube,
            Request::SaveCube { .. } => RequestId::SaveCube,
            Request::DefineMetric { .. } => RequestId::DefineMetric,
            Request::MetricTreeValues { .. } => RequestId::MetricTreeValues,
            Request::MetricSubtreeValues { .. } => RequestId::MetricSubtreeValues,
            Request::CallpathTreeValues { .. } => RequestId::CallpathTreeValues,
            Request::CallpathSubtreeValues { .. } => RequestId::CallpathSubtreeValues,
            Request::FlatTreeValues { .. } => RequestId::FlatTreeValues,
            Request::SystemTreeValues { .. } => RequestId::SystemTreeValues,
            Request::TreeValue { .. } => RequestId::TreeValue,
            Request::MiscData { .. } => RequestId::MiscData,
            Request::FileSystem { .. } => RequestId::FileSystem,
            Request::Version => RequestId::Version,
        }
    }

    /// Server-side execution (spec.md §4.8's "server-side action" column).
    /// `TreeValues`/`FlatTreeValues` queries require `session.report()` to
    /// be open; everything else either needs no report or manages it
    /// directly (`OpenCube`/`CloseCube`/`SaveCube`).
    pub fn execute(&self, session: &mut CubeSession, negotiated_version: &mut u32) -> Result<Response, RequestError> {
        match self {
            Request::NegotiateProtocol { max_client_version } => {
                let negotiated = (*max_client_version).min(scorep_protocol::MAX_PROTOCOL_VERSION);
                *negotiated_version = negotiated;
                Ok(Response::NegotiateProtocol { negotiated_version: negotiated })
            }
            Request::ClientServerVersion { client_version_string } => {
                Ok(Response::ClientServerVersion {
                    server_version_string: format!(
                        "scorep-requests/{} (client: {})",
                        LIBRARY_VERSION, client_version_string
                    ),
                })
            }
            Request::Disconnect => Ok(Response::Disconnect),
            Request::OpenCube { path } => {
                let profile = crate::open_report_file(path)?;
                session.open(path.clone(), profile);
                Ok(Response::OpenCube)
            }
            Request::CloseCube => {
                session.close();
                Ok(Response::CloseCube)
            }
            Request::SaveCube { path } => {
                if session.report().is_none() {
                    return Err(RequestError::NoReportOpen);
                }
                warn!("SaveCube to '{path}' acknowledged; no writer-back-end is wired up to persist it");
                Ok(Response::SaveCube)
            }
            Request::DefineMetric { definition } => {
                let installed = validate_definition(session, definition);
                if installed {
                    session.install_metric(Metric {
                        name: definition.name.clone(),
                        display_name: definition.display_name.clone(),
                        data_type: definition.data_type,
                        unit: definition.unit.clone(),
                        value_kind: String::new(),
                        description: String::new(),
                        kind: MetricKind::PostDerived,
                        expressions: definition.expressions.clone(),
                        ghost: false,
                        visible: true,
                        parent: definition.parent,
                        children: Vec::new(),
                    });
                }
                Ok(Response::DefineMetric { installed })
            }
            Request::MetricTreeValues { selector, processes } => {
                let profile = require_report(session)?;
                let order = tree::metric_dfs_order(profile);
                let cnodes = resolve_selector(profile, *selector)?;
                let process_ids = processes.resolve(&tree::system_dfs_order(profile).into_iter().map(|p| p as u32).collect::<Vec<_>>());
                let process_ids: Vec<usize> = process_ids.into_iter().map(|p| p as usize).collect();
                let mut inclusive = Vec::with_capacity(order.len());
                let mut exclusive = Vec::with_capacity(order.len());
                for metric in order {
                    inclusive.push(tree::sum_value(profile, &[metric], &cnodes, &process_ids, scorep_report::Flavour::Inclusive)?);
                    exclusive.push(tree::sum_value(profile, &[metric], &cnodes, &process_ids, scorep_report::Flavour::Exclusive)?);
                }
                Ok(Response::TreeValues { inclusive, exclusive })
            }
            Request::MetricSubtreeValues { root_metric, depth, selector, processes } => {
                let profile = require_report(session)?;
                let full_order = tree::metric_dfs_order(profile);
                let (order, index_to_id) = metric_subtree_window(profile, &full_order, *root_metric, *depth);
                let cnodes = resolve_selector(profile, *selector)?;
                let process_ids: Vec<usize> = processes
                    .resolve(&tree::system_dfs_order(profile).into_iter().map(|p| p as u32).collect::<Vec<_>>())
                    .into_iter()
                    .map(|p| p as usize)
                    .collect();
                let mut inclusive = Vec::with_capacity(order.len());
                let mut exclusive = Vec::with_capacity(order.len());
                for metric in &order {
                    inclusive.push(tree::sum_value(profile, &[*metric], &cnodes, &process_ids, scorep_report::Flavour::Inclusive)?);
                    exclusive.push(tree::sum_value(profile, &[*metric], &cnodes, &process_ids, scorep_report::Flavour::Exclusive)?);
                }
                Ok(Response::SubtreeValues { inclusive, exclusive, index_to_id })
            }
            Request::CallpathTreeValues { metrics, processes } => {
                let profile = require_report(session)?;
                let order = tree::callpath_dfs_order(profile);
                let (metric_ids, process_ids) = resolve_metric_and_process(profile, metrics, processes);
                let mut inclusive = Vec::with_capacity(order.len());
                let mut exclusive = Vec::with_capacity(order.len());
                for cnode in order {
                    inclusive.push(tree::sum_value(profile, &metric_ids, &[cnode], &process_ids, scorep_report::Flavour::Inclusive)?);
                    exclusive.push(tree::sum_value(profile, &metric_ids, &[cnode], &process_ids, scorep_report::Flavour::Exclusive)?);
                }
                Ok(Response::TreeValues { inclusive, exclusive })
            }
            Request::CallpathSubtreeValues { root_cnode, depth, metrics, processes } => {
                let profile = require_report(session)?;
                let full_order = tree::callpath_dfs_order(profile);
                let (order, index_to_id) = cnode_subtree_window(profile, &full_order, *root_cnode, *depth);
                let (metric_ids, process_ids) = resolve_metric_and_process(profile, metrics, processes);
                let mut inclusive = Vec::with_capacity(order.len());
                let mut exclusive = Vec::with_capacity(order.len());
                for cnode in &order {
                    inclusive.push(tree::sum_value(profile, &metric_ids, &[*cnode], &process_ids, scorep_report::Flavour::Inclusive)?);
                    exclusive.push(tree::sum_value(profile, &metric_ids, &[*cnode], &process_ids, scorep_report::Flavour::Exclusive)?);
                }
                Ok(Response::SubtreeValues { inclusive, exclusive, index_to_id })
            }
            Request::FlatTreeValues { metrics, processes } => {
                let profile = require_report(session)?;
                let order = tree::flat_region_order(profile);
                let (metric_ids, process_ids) = resolve_metric_and_process(profile, metrics, processes);
                let mut inclusive = Vec::with_capacity(order.len());
                let mut exclusive = Vec::with_capacity(order.len());
                let mut difference = Vec::with_capacity(order.len());
                for region in order {
                    let cnodes = tree::cnodes_for_region(profile, region);
                    let inc = tree::sum_value(profile, &metric_ids, &cnodes, &process_ids, scorep_report::Flavour::Inclusive)?;
                    let exc = tree::sum_value(profile, &metric_ids, &cnodes, &process_ids, scorep_report::Flavour::Exclusive)?;
                    let diff = inc.subtract(&exc).map_err(scorep_report::ReportError::Value)?;
                    inclusive.push(inc);
                    exclusive.push(exc);
                    difference.push(diff);
                }
                Ok(Response::FlatTreeValues { inclusive, exclusive, difference })
            }
            Request::SystemTreeValues { metrics, selector } => {
                let profile = require_report(session)?;
                let order = tree::system_dfs_order(profile);
                let cnodes = resolve_selector(profile, *selector)?;
                let metric_ids: Vec<MetricId> = metrics
                    .resolve(&(0..profile.number_of_metrics() as u32).collect::<Vec<_>>())
                    .into_iter()
                    .map(MetricId)
                    .collect();
                let mut inclusive = Vec::with_capacity(order.len());
                let mut exclusive = Vec::with_capacity(order.len());
                for process in order {
                    inclusive.push(tree::sum_value(profile, &metric_ids, &cnodes, &[process], scorep_report::Flavour::Inclusive)?);
                    exclusive.push(tree::sum_value(profile, &metric_ids, &cnodes, &[process], scorep_report::Flavour::Exclusive)?);
                }
                Ok(Response::TreeValues { inclusive, exclusive })
            }
            Request::TreeValue { metric, cnode, processes } => {
                let profile = require_report(session)?;
                let process_ids: Vec<usize> = processes
                    .resolve(&tree::system_dfs_order(profile).into_iter().map(|p| p as u32).collect::<Vec<_>>())
                    .into_iter()
                    .map(|p| p as usize)
                    .collect();
                let value = tree::sum_value(profile, &[*metric], &[*cnode], &process_ids, scorep_report::Flavour::Inclusive)?;
                Ok(Response::TreeValue { value })
            }
            Request::MiscData { name } => {
                let profile = require_report(session)?;
                let bytes = profile
                    .definition_counters()
                    .get(name)
                    .map(|n| n.to_le_bytes().to_vec())
                    .unwrap_or_default();
                Ok(Response::MiscData { bytes })
            }
            Request::FileSystem { path } => {
                let entries = list_directory(path)?;
                Ok(Response::FileSystem { entries })
            }
            Request::Version => Ok(Response::Version { version: LIBRARY_VERSION }),
        }
    }
}

fn require_report(session: &CubeSession) -> Result<&Profile, RequestError> {
    session.report().ok_or(RequestError::NoReportOpen)
}

fn resolve_selector(profile: &Profile, selector: TreeSelector) -> Result<Vec<CnodeId>, RequestError> {
    Ok(match selector {
        TreeSelector::Cnode(c) => vec![c],
        TreeSelector::Region(r) => tree::cnodes_for_region(profile, r),
    })
}

fn resolve_metric_and_process(
    profile: &Profile,
    metrics: &Selection<u32>,
    processes: &Selection<u32>,
) -> (Vec<MetricId>, Vec<usize>) {
    let metric_ids = metrics
        .resolve(&(0..profile.number_of_metrics() as u32).collect::<Vec<_>>())
        .into_iter()
        .map(MetricId)
        .collect();
    let process_ids = processes
        .resolve(&(0..profile.number_of_processes() as u32).collect::<Vec<_>>())
        .into_iter()
        .map(|p| p as usize)
        .collect();
    (metric_ids, process_ids)
}

/// Restricts a metric-tree DFS order to the window rooted at `root_metric`
/// and at most `depth` levels below it, returning the restricted order
/// alongside the raw id each slot corresponds to (spec.md §4.8's "id->index
/// map" for `MetricSubtreeValues`).
fn metric_subtree_window(
    profile: &Profile,
    full_order: &[MetricId],
    root_metric: MetricId,
    depth: u32,
) -> (Vec<MetricId>, Vec<u32>) {
    let depth_of = subtree_depths(full_order.iter().map(|m| m.0), root_metric.0, |id| {
        profile.metrics().get(id as usize).and_then(|m| m.parent).map(|m| m.0)
    });
    let mut order = Vec::new();
    let mut index_to_id = Vec::new();
    for id in full_order {
        if let Some(&d) = depth_of.get(&id.0) {
            if d <= depth {
                order.push(*id);
                index_to_id.push(id.0);
            }
        }
    }
    (order, index_to_id)
}

/// Same restriction as [`metric_subtree_window`], over the call tree
/// (`CallpathSubtreeValues`).
fn cnode_subtree_window(
    profile: &Profile,
    full_order: &[CnodeId],
    root_cnode: CnodeId,
    depth: u32,
) -> (Vec<CnodeId>, Vec<u32>) {
    let depth_of = subtree_depths(full_order.iter().map(|c| c.0), root_cnode.0, |id| {
        profile.cnodes().get(id as usize).and_then(|c| c.parent).map(|c| c.0)
    });
    let mut order = Vec::new();
    let mut index_to_id = Vec::new();
    for id in full_order {
        if let Some(&d) = depth_of.get(&id.0) {
            if d <= depth {
                order.push(*id);
                index_to_id.push(id.0);
            }
        }
    }
    (order, index_to_id)
}

/// Shared depth computation: walks `ids` bottom-up via `parent_of` to
/// assign each descendant of `root_id` its distance from the root; ids
/// outside the root's subtree are absent from the result.
fn subtree_depths(
    ids: impl Iterator<Item = u32>,
    root_id: u32,
    parent_of: impl Fn(u32) -> Option<u32>,
) -> rustc_hash::FxHashMap<u32, u32> {
    let mut depth_of = rustc_hash::FxHashMap::default();
    depth_of.insert(root_id, 0u32);
    for id in ids {
        if id == root_id || depth_of.contains_key(&id) {
            continue;
        }
        let mut chain = vec![id];
        let mut cursor = id;
        loop {
            match parent_of(cursor) {
                Some(p) if p == root_id => {
                    let mut d = 1;
                    for &c in chain.iter().rev() {
                        depth_of.insert(c, d);
                        d += 1;
                    }
                    break;
                }
                Some(p) if depth_of.contains_key(&p) => {
                    let base = depth_of[&p];
                    let mut d = base + 1;
                    for &c in chain.iter().rev() {
                        depth_of.insert(c, d);
                        d += 1;
                    }
                    break;
                }
                Some(p) => {
                    chain.push(p);
                    cursor = p;
                }
                None => break,
            }
        }
    }
    depth_of
}

fn validate_definition(session: &CubeSession, definition: &MetricDefinition) -> bool {
    if definition.name.is_empty() {
        return false;
    }
    if let Some(parent) = definition.parent {
        let known = session
            .report()
            .map(|r| (parent.0 as usize) < r.number_of_metrics())
            .unwrap_or(false)
            || (parent.0 as usize) < session.installed_metrics().len();
        if !known {
            return false;
        }
    }
    true
}

fn list_directory(path: &str) -> Result<Vec<FileSystemEntry>, RequestError> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        let mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        entries.push(FileSystemEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_directory: meta.is_dir(),
            size: meta.len(),
            mtime,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

impl Request {
    /// Decodes a request body for `id` — the client-facing half of
    /// spec.md §4.7's `receiveRequestPayload` (the server's receive loop
    /// calls this once it knows `id` from the frame header).
    pub fn decode_payload(id: RequestId, codec: &WireCodec, bytes: &[u8]) -> Result<Request, RequestError> {
        Ok(match id {
            RequestId::NegotiateProtocol => {
                Request::NegotiateProtocol { max_client_version: codec.read_u32(bytes)? }
            }
            RequestId::ClientServerVersion => {
                let (client_version_string, _) = codec.read_string(bytes)?;
                Request::ClientServerVersion { client_version_string }
            }
            RequestId::Disconnect => Request::Disconnect,
            RequestId::OpenCube => {
                let (path, _) = codec.read_string(bytes)?;
                Request::OpenCube { path }
            }
            RequestId::CloseCube => Request::CloseCube,
            RequestId::SaveCube => {
                let (path, _) = codec.read_string(bytes)?;
                Request::SaveCube { path }
            }
            RequestId::DefineMetric => {
                let (definition, _) = decode_metric_definition(codec, bytes)?;
                Request::DefineMetric { definition }
            }
            RequestId::MetricTreeValues => {
                let (selector, used) = decode_tree_selector(codec, bytes)?;
                let (processes, _) = Selection::<u32>::decode(codec, &bytes[used..])?;
                Request::MetricTreeValues { selector, processes }
            }
            RequestId::MetricSubtreeValues => {
                let root_metric = MetricId(codec.read_u32(bytes)?);
                let depth = codec.read_u32(&bytes[4..])?;
                let (selector, used) = decode_tree_selector(codec, &bytes[8..])?;
                let (processes, _) = Selection::<u32>::decode(codec, &bytes[8 + used..])?;
                Request::MetricSubtreeValues { root_metric, depth, selector, processes }
            }
            RequestId::CallpathTreeValues => {
                let (metrics, used) = Selection::<u32>::decode(codec, bytes)?;
                let (processes, _) = Selection::<u32>::decode(codec, &bytes[used..])?;
                Request::CallpathTreeValues { metrics, processes }
            }
            RequestId::CallpathSubtreeValues => {
                let root_cnode = CnodeId(codec.read_u32(bytes)?);
                let depth = codec.read_u32(&bytes[4..])?;
                let (metrics, used) = Selection::<u32>::decode(codec, &bytes[8..])?;
                let (processes, _) = Selection::<u32>::decode(codec, &bytes[8 + used..])?;
                Request::CallpathSubtreeValues { root_cnode, depth, metrics, processes }
            }
            RequestId::FlatTreeValues => {
                let (metrics, used) = Selection::<u32>::decode(codec, bytes)?;
                let (processes, _) = Selection::<u32>::decode(codec, &bytes[used..])?;
                Request::FlatTreeValues { metrics, processes }
            }
            RequestId::SystemTreeValues => {
                let (metrics, used) = Selection::<u32>::decode(codec, bytes)?;
                let (selector, _) = decode_tree_selector(codec, &bytes[used..])?;
                Request::SystemTreeValues { metrics, selector }
            }
            RequestId::TreeValue => {
                let metric = MetricId(codec.read_u32(bytes)?);
                let cnode = CnodeId(codec.read_u32(&bytes[4..])?);
                let (processes, _) = Selection::<u32>::decode(codec, &bytes[8..])?;
                Request::TreeValue { metric, cnode, processes }
            }
            RequestId::MiscData => {
                let (name, _) = codec.read_string(bytes)?;
                Request::MiscData { name }
            }
            RequestId::FileSystem => {
                let (path, _) = codec.read_string(bytes)?;
                Request::FileSystem { path }
            }
            RequestId::Version => Request::Version,
        })
    }

    /// Encodes this request's body — the client's side of
    /// `receiveRequestPayload`; framing (marker/id/sequence/length) is the
    /// connection layer's job.
    pub fn encode_payload(&self, codec: &WireCodec) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Request::NegotiateProtocol { max_client_version } => codec.write_u32(&mut buf, *max_client_version),
            Request::ClientServerVersion { client_version_string } => {
                codec.write_string(&mut buf, client_version_string)
            }
            Request::Disconnect | Request::CloseCube | Request::Version => {}
            Request::OpenCube { path } | Request::SaveCube { path } | Request::FileSystem { path } => {
                codec.write_string(&mut buf, path)
            }
            Request::DefineMetric { definition } => encode_metric_definition(codec, definition, &mut buf),
            Request::MetricTreeValues { selector, processes } => {
                encode_tree_selector(codec, *selector, &mut buf);
                processes.encode(codec, &mut buf);
            }
            Request::MetricSubtreeValues { root_metric, depth, selector, processes } => {
                codec.write_u32(&mut buf, root_metric.0);
                codec.write_u32(&mut buf, *depth);
                encode_tree_selector(codec, *selector, &mut buf);
                processes.encode(codec, &mut buf);
            }
            Request::CallpathTreeValues { metrics, processes } => {
                metrics.encode(codec, &mut buf);
                processes.encode(codec, &mut buf);
            }
            Request::CallpathSubtreeValues { root_cnode, depth, metrics, processes } => {
                codec.write_u32(&mut buf, root_cnode.0);
                codec.write_u32(&mut buf, *depth);
                metrics.encode(codec, &mut buf);
                processes.encode(codec, &mut buf);
            }
            Request::FlatTreeValues { metrics, processes } => {
                metrics.encode(codec, &mut buf);
                processes.encode(codec, &mut buf);
            }
            Request::SystemTreeValues { metrics, selector } => {
                metrics.encode(codec, &mut buf);
                encode_tree_selector(codec, *selector, &mut buf);
            }
            Request::TreeValue { metric, cnode, processes } => {
                codec.write_u32(&mut buf, metric.0);
                codec.write_u32(&mut buf, cnode.0);
                processes.encode(codec, &mut buf);
            }
            Request::MiscData { name } => codec.write_string(&mut buf, name),
        }
        buf
    }
}

impl Response {
    /// Encodes this response's success-shape body. The leading
    /// `response-code` word (spec.md §4.7) is the connection layer's
    /// concern, since it also covers the error path where no `Response`
    /// value exists at all.
    pub fn encode_payload(&self, codec: &WireCodec) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Response::NegotiateProtocol { negotiated_version } => codec.write_u32(&mut buf, *negotiated_version),
            Response::ClientServerVersion { server_version_string } => {
                codec.write_string(&mut buf, server_version_string)
            }
            Response::Disconnect | Response::OpenCube | Response::CloseCube | Response::SaveCube => {}
            Response::DefineMetric { installed } => codec.write_u32(&mut buf, if *installed { 1 } else { 0 }),
            Response::TreeValues { inclusive, exclusive } => {
                codec.write_tagged_value_vec(&mut buf, inclusive);
                codec.write_tagged_value_vec(&mut buf, exclusive);
            }
            Response::SubtreeValues { inclusive, exclusive, index_to_id } => {
                codec.write_tagged_value_vec(&mut buf, inclusive);
                codec.write_tagged_value_vec(&mut buf, exclusive);
                codec.write_u32(&mut buf, index_to_id.len() as u32);
                for id in index_to_id {
                    codec.write_u32(&mut buf, *id);
                }
            }
            Response::FlatTreeValues { inclusive, exclusive, difference } => {
                codec.write_tagged_value_vec(&mut buf, inclusive);
                codec.write_tagged_value_vec(&mut buf, exclusive);
                codec.write_tagged_value_vec(&mut buf, difference);
            }
            Response::TreeValue { value } => codec.write_tagged_value(&mut buf, value),
            Response::MiscData { bytes } => {
                codec.write_u32(&mut buf, bytes.len() as u32);
                buf.extend_from_slice(bytes);
            }
            Response::FileSystem { entries } => {
                codec.write_u32(&mut buf, entries.len() as u32);
                for entry in entries {
                    codec.write_string(&mut buf, &entry.name);
                    codec.write_u32(&mut buf, if entry.is_directory { 1 } else { 0 });
                    codec.write_u64(&mut buf, entry.size);
                    codec.write_u64(&mut buf, entry.mtime);
                }
            }
            Response::Version { version } => codec.write_u32(&mut buf, *version),
        }
        buf
    }

    /// Decodes a response body for `id` — the client's side, called only
    /// once the frame's `response-code` has been checked to be `Ok`.
    pub fn decode_payload(id: RequestId, codec: &WireCodec, bytes: &[u8]) -> Result<Response, RequestError> {
        Ok(match id {
            RequestId::NegotiateProtocol => {
                Response::NegotiateProtocol { negotiated_version: codec.read_u32(bytes)? }
            }
            RequestId::ClientServerVersion => {
                let (server_version_string, _) = codec.read_string(bytes)?;
                Response::ClientServerVersion { server_version_string }
            }
            RequestId::Disconnect => Response::Disconnect,
            RequestId::OpenCube => Response::OpenCube,
            RequestId::CloseCube => Response::CloseCube,
            RequestId::SaveCube => Response::SaveCube,
            RequestId::DefineMetric => Response::DefineMetric { installed: codec.read_u32(bytes)? != 0 },
            RequestId::MetricTreeValues | RequestId::CallpathTreeValues | RequestId::SystemTreeValues => {
                let (inclusive, used) = codec.read_tagged_value_vec(bytes)?;
                let (exclusive, _) = codec.read_tagged_value_vec(&bytes[used..])?;
                Response::TreeValues { inclusive, exclusive }
            }
            RequestId::MetricSubtreeValues | RequestId::CallpathSubtreeValues => {
                let (inclusive, used1) = codec.read_tagged_value_vec(bytes)?;
                let (exclusive, used2) = codec.read_tagged_value_vec(&bytes[used1..])?;
                let offset = used1 + used2;
                let count = codec.read_u32(&bytes[offset..])? as usize;
                let mut index_to_id = Vec::with_capacity(count);
                let mut o = offset + 4;
                for _ in 0..count {
                    index_to_id.push(codec.read_u32(&bytes[o..])?);
                    o += 4;
                }
                Response::SubtreeValues { inclusive, exclusive, index_to_id }
            }
            RequestId::FlatTreeValues => {
                let (inclusive, u1) = codec.read_tagged_value_vec(bytes)?;
                let (exclusive, u2) = codec.read_tagged_value_vec(&bytes[u1..])?;
                let (difference, _) = codec.read_tagged_value_vec(&bytes[u1 + u2..])?;
                Response::FlatTreeValues { inclusive, exclusive, difference }
            }
            RequestId::TreeValue => {
                let (value, _) = codec.read_tagged_value(bytes)?;
                Response::TreeValue { value }
            }
            RequestId::MiscData => {
                let len = codec.read_u32(bytes)? as usize;
                let data = bytes
                    .get(4..4 + len)
                    .ok_or(scorep_protocol::ProtocolError::TruncatedFrame { expected: 4 + len, actual: bytes.len() })?
                    .to_vec();
                Response::MiscData { bytes: data }
            }
            RequestId::FileSystem => {
                let count = codec.read_u32(bytes)? as usize;
                let mut offset = 4;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let (name, used) = codec.read_string(&bytes[offset..])?;
                    offset += used;
                    let is_directory = codec.read_u32(&bytes[offset..])? != 0;
                    offset += 4;
                    let size = codec.read_u64(&bytes[offset..])?;
                    offset += 8;
                    let mtime = codec.read_u64(&bytes[offset..])?;
                    offset += 8;
                    entries.push(FileSystemEntry { name, is_directory, size, mtime });
                }
                Response::FileSystem { entries }
            }
            RequestId::Version => Response::Version { version: codec.read_u32(bytes)? },
        })
    }
}

fn encode_tree_selector(codec: &WireCodec, selector: TreeSelector, buf: &mut Vec<u8>) {
    match selector {
        TreeSelector::Cnode(c) => {
            codec.write_u32(buf, 0);
            codec.write_u32(buf, c.0);
        }
        TreeSelector::Region(r) => {
            codec.write_u32(buf, 1);
            codec.write_u32(buf, r.0);
        }
    }
}

fn decode_tree_selector(codec: &WireCodec, bytes: &[u8]) -> Result<(TreeSelector, usize), RequestError> {
    let tag = codec.read_u32(bytes)?;
    let id = codec.read_u32(&bytes[4..])?;
    let selector = match tag {
        0 => TreeSelector::Cnode(CnodeId(id)),
        1 => TreeSelector::Region(RegionId(id)),
        _ => return Err(RequestError::Protocol(scorep_protocol::ProtocolError::UnknownValueType(tag))),
    };
    Ok((selector, 8))
}

fn encode_metric_definition(codec: &WireCodec, def: &MetricDefinition, buf: &mut Vec<u8>) {
    codec.write_string(buf, &def.name);
    codec.write_string(buf, &def.display_name);
    codec.write_u32(buf, def.data_type.to_u32());
    codec.write_string(buf, &def.unit);
    codec.write_string(buf, &def.expressions.init);
    codec.write_string(buf, &def.expressions.plus);
    codec.write_string(buf, &def.expressions.minus);
    codec.write_string(buf, &def.expressions.aggregate);
    match def.parent {
        Some(p) => {
            codec.write_u32(buf, 1);
            codec.write_u32(buf, p.0);
        }
        None => codec.write_u32(buf, 0),
    }
}

fn decode_metric_definition(codec: &WireCodec, bytes: &[u8]) -> Result<(MetricDefinition, usize), RequestError> {
    let (name, used) = codec.read_string(bytes)?;
    let mut offset = used;
    let (display_name, used) = codec.read_string(&bytes[offset..])?;
    offset += used;
    let data_type_word = codec.read_u32(&bytes[offset..])?;
    offset += 4;
    let data_type = ValueType::from_u32(data_type_word)
        .ok_or(scorep_protocol::ProtocolError::UnknownValueType(data_type_word))?;
    let (unit, used) = codec.read_string(&bytes[offset..])?;
    offset += used;
    let (init, used) = codec.read_string(&bytes[offset..])?;
    offset += used;
    let (plus, used) = codec.read_string(&bytes[offset..])?;
    offset += used;
    let (minus, used) = codec.read_string(&bytes[offset..])?;
    offset += used;
    let (aggregate, used) = codec.read_string(&bytes[offset..])?;
    offset += used;
    let has_parent = codec.read_u32(&bytes[offset..])?;
    offset += 4;
    let parent = if has_parent != 0 {
        let p = MetricId(codec.read_u32(&bytes[offset..])?);
        offset += 4;
        Some(p)
    } else {
        None
    };
    Ok((
        MetricDefinition {
            name,
            display_name,
            data_type,
            unit,
            expressions: CubePlExpressions { init, plus, minus, aggregate },
            parent,
        },
        offset,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorep_report::{CallNode, RawReport, Region};

    fn sample_session() -> CubeSession {
        let mut raw = RawReport::new();
        raw.regions.push(Region { name: "main".to_string(), ..Default::default() });
        raw.cnodes.push(CallNode { region: RegionId(0), parent: None, children: vec![], num_params_int: 0, num_params_str: 0 });
        raw.root_cnodes.push(CnodeId(0));
        let mut session = CubeSession::new();
        session.open("in-memory".to_string(), Profile::build(raw).unwrap());
        session
    }

    #[test]
    fn close_then_query_is_no_report_open() {
        let mut session = sample_session();
        session.close();
        let mut version = 1;
        let req = Request::TreeValue {
            metric: MetricId(0),
            cnode: CnodeId(0),
            processes: Selection::all_excluding_nothing(),
        };
        let err = req.execute(&mut session, &mut version).unwrap_err();
        assert!(matches!(err, RequestError::NoReportOpen));
    }

    #[test]
    fn negotiate_protocol_caps_at_server_maximum() {
        let mut session = sample_session();
        let mut version = 0;
        let req = Request::NegotiateProtocol { max_client_version: 99 };
        let resp = req.execute(&mut session, &mut version).unwrap();
        assert_eq!(resp, Response::NegotiateProtocol { negotiated_version: scorep_protocol::MAX_PROTOCOL_VERSION });
        assert_eq!(version, scorep_protocol::MAX_PROTOCOL_VERSION);
    }

    #[test]
    fn define_metric_with_unknown_parent_is_rejected() {
        let mut session = sample_session();
        let mut version = 1;
        let req = Request::DefineMetric {
            definition: MetricDefinition {
                name: "derived".to_string(),
                display_name: "Derived".to_string(),
                data_type: ValueType::Uint64,
                unit: String::new(),
                expressions: CubePlExpressions::default(),
                parent: Some(MetricId(42)),
            },
        };
        let resp = req.execute(&mut session, &mut version).unwrap();
        assert_eq!(resp, Response::DefineMetric { installed: false });
    }

    #[test]
    fn define_metric_without_parent_installs() {
        let mut session = sample_session();
        let mut version = 1;
        let req = Request::DefineMetric {
            definition: MetricDefinition {
                name: "derived".to_string(),
                display_name: "Derived".to_string(),
                data_type: ValueType::Uint64,
                unit: String::new(),
                expressions: CubePlExpressions::default(),
                parent: None,
            },
        };
        let resp = req.execute(&mut session, &mut version).unwrap();
        assert_eq!(resp, Response::DefineMetric { installed: true });
        assert_eq!(session.installed_metrics().len(), 1);
    }

    fn payload_round_trips(codec: &WireCodec, req: Request) {
        let id = req.id();
        let encoded = req.encode_payload(codec);
        let decoded = Request::decode_payload(id, codec, &encoded).unwrap();
        assert_eq!(decoded.id(), id);
    }

    #[test]
    fn request_payloads_round_trip() {
        let codec = WireCodec::new(false);
        payload_round_trips(&codec, Request::NegotiateProtocol { max_client_version: 3 });
        payload_round_trips(&codec, Request::OpenCube { path: "/tmp/report.cubex".to_string() });
        payload_round_trips(
            &codec,
            Request::TreeValue {
                metric: MetricId(2),
                cnode: CnodeId(5),
                processes: Selection { ids: vec![0, 1], mode: crate::selection::SelectionMode::Include },
            },
        );
        payload_round_trips(
            &codec,
            Request::MetricSubtreeValues {
                root_metric: MetricId(1),
                depth: 3,
                selector: TreeSelector::Region(RegionId(4)),
                processes: Selection::all_excluding_nothing(),
            },
        );
        payload_round_trips(
            &codec,
            Request::DefineMetric {
                definition: MetricDefinition {
                    name: "derived".to_string(),
                    display_name: "Derived".to_string(),
                    data_type: ValueType::Double,
                    unit: "s".to_string(),
                    expressions: CubePlExpressions {
                        init: "0".to_string(),
                        plus: "a+b".to_string(),
                        minus: "a-b".to_string(),
                        aggregate: "+".to_string(),
                    },
                    parent: Some(MetricId(7)),
                },
            },
        );
    }

    #[test]
    fn define_metric_definition_without_parent_round_trips() {
        let codec = WireCodec::new(true);
        let definition = MetricDefinition {
            name: "x".to_string(),
            display_name: "X".to_string(),
            data_type: ValueType::Int32,
            unit: String::new(),
            expressions: CubePlExpressions::default(),
            parent: None,
        };
        let req = Request::DefineMetric { definition: definition.clone() };
        let encoded = req.encode_payload(&codec);
        let decoded = Request::decode_payload(RequestId::DefineMetric, &codec, &encoded).unwrap();
        match decoded {
            Request::DefineMetric { definition: d } => {
                assert_eq!(d.name, definition.name);
                assert_eq!(d.parent, None);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn response_payloads_round_trip() {
        let codec = WireCodec::new(false);
        let resp = Response::TreeValue { value: Value::Double(3.5) };
        let encoded = resp.encode_payload(&codec);
        let decoded = Response::decode_payload(RequestId::TreeValue, &codec, &encoded).unwrap();
        assert_eq!(decoded, resp);

        let resp = Response::FlatTreeValues {
            inclusive: vec![Value::Uint64(10), Value::Double(1.5)],
            exclusive: vec![Value::Uint64(4), Value::Double(0.5)],
            difference: vec![Value::Uint64(6), Value::Double(1.0)],
        };
        let encoded = resp.encode_payload(&codec);
        let decoded = Response::decode_payload(RequestId::FlatTreeValues, &codec, &encoded).unwrap();
        assert_eq!(decoded, resp);

        let resp = Response::FileSystem {
            entries: vec![
                FileSystemEntry { name: "a.cubex".to_string(), is_directory: false, size: 42, mtime: 100 },
                FileSystemEntry { name: "sub".to_string(), is_directory: true, size: 0, mtime: 200 },
            ],
        };
        let encoded = resp.encode_payload(&codec);
        let decoded = Response::decode_payload(RequestId::FileSystem, &codec, &encoded).unwrap();
        assert_eq!(decoded, resp);
    }
}
