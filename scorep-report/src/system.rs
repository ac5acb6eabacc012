//! System resource tree: location-groups (PROCESS or ACCELERATOR) grouping
//! leaf locations, grounded on `cube::SystemTreeNode`/`cube::LocationGroup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationGroupKind {
    Process,
    Accelerator,
}

#[derive(Debug, Clone)]
pub struct Location {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct LocationGroup {
    pub name: String,
    pub kind: LocationGroupKind,
    /// The `"Creating location group"` attribute: for `Accelerator` groups,
    /// the name of the PROCESS group whose trace buffer their contribution
    /// rolls into. `None`/unresolvable is dropped with a warning at
    /// adapter-construction time (spec.md §4.2 [FULL] supplement).
    pub creating_location_group: Option<String>,
    pub locations: Vec<Location>,
}

#[derive(Debug, Clone, Default)]
pub struct SystemTree {
    pub location_groups: Vec<LocationGroup>,
}

impl SystemTree {
    pub fn process_groups(&self) -> impl Iterator<Item = (usize, &LocationGroup)> {
        self.location_groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.kind == LocationGroupKind::Process)
    }
}
