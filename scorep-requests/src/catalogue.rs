//! Request id registry (spec.md §4.7/§4.8): one id per request type, and
//! the version at which it first becomes valid. `NegotiateProtocol` resets
//! both sides to exactly the set registered for the negotiated version.
use scorep_protocol::{PROTOCOL_VERSION_0, PROTOCOL_VERSION_1};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestId {
    NegotiateProtocol = 0,
    ClientServerVersion = 1,
    Disconnect = 2,
    OpenCube = 3,
    CloseCube = 4,
    SaveCube = 5,
    DefineMetric = 6,
    MetricTreeValues = 7,
    MetricSubtreeValues = 8,
    CallpathTreeValues = 9,
    CallpathSubtreeValues = 10,
    FlatTreeValues = 11,
    SystemTreeValues = 12,
    TreeValue = 13,
    MiscData = 14,
    FileSystem = 15,
    Version = 16,
}

impl RequestId {
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(v: u32) -> Option<RequestId> {
        Some(match v {
            0 => RequestId::NegotiateProtocol,
            1 => RequestId::ClientServerVersion,
            2 => RequestId::Disconnect,
            3 => RequestId::OpenCube,
            4 => RequestId::CloseCube,
            5 => RequestId::SaveCube,
            6 => RequestId::DefineMetric,
            7 => RequestId::MetricTreeValues,
            8 => RequestId::MetricSubtreeValues,
            9 => RequestId::CallpathTreeValues,
            10 => RequestId::CallpathSubtreeValues,
            11 => RequestId::FlatTreeValues,
            12 => RequestId::SystemTreeValues,
            13 => RequestId::TreeValue,
            14 => RequestId::MiscData,
            15 => RequestId::FileSystem,
            16 => RequestId::Version,
            _ => return None,
        })
    }

    /// The protocol version at which this request first becomes valid
    /// (spec.md §4.7): version 0 carries only the three handshake/teardown
    /// requests, version 1 adds the rest.
    pub fn minimum_version(self) -> u32 {
        match self {
            RequestId::NegotiateProtocol | RequestId::ClientServerVersion | RequestId::Disconnect => {
                PROTOCOL_VERSION_0
            }
            _ => PROTOCOL_VERSION_1,
        }
    }

    pub fn is_registered_for(self, negotiated_version: u32) -> bool {
        self.minimum_version() <= negotiated_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_0_excludes_tree_queries() {
        assert!(!RequestId::MetricTreeValues.is_registered_for(PROTOCOL_VERSION_0));
        assert!(RequestId::MetricTreeValues.is_registered_for(PROTOCOL_VERSION_1));
        assert!(RequestId::Disconnect.is_registered_for(PROTOCOL_VERSION_0));
    }

    #[test]
    fn round_trips_through_u32() {
        for id in [
            RequestId::NegotiateProtocol,
            RequestId::OpenCube,
            RequestId::FlatTreeValues,
            RequestId::Version,
        ] {
            assert_eq!(RequestId::from_u32(id.to_u32()), Some(id));
        }
        assert_eq!(RequestId::from_u32(999), None);
    }
}
