//! Hierarchy typing and the containment tree.
//!
//! Catalogue sheets map onto five hierarchy levels. The top four
//! (series, sub-series, box, folder) are `rico:RecordSet`s, the leaf
//! (document) is a `rico:Record`. Containment edges always point from a
//! shallower level to a deeper one, so the tree can never contain a cycle.

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::report::Issue;

/// A level of the archival hierarchy, shallowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HierarchyLevel {
    Series,
    Subseries,
    Box,
    Folder,
    Document,
}

impl HierarchyLevel {
    pub const ALL: [HierarchyLevel; 5] = [
        Self::Series,
        Self::Subseries,
        Self::Box,
        Self::Folder,
        Self::Document,
    ];

    /// Recognize a sheet name (Italian or English, singular or plural).
    pub fn from_sheet_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "serie" | "series" => Some(Self::Series),
            "sottoserie" | "sottoseries" | "subseries" | "sub-series" => Some(Self::Subseries),
            "busta" | "buste" | "box" | "boxes" => Some(Self::Box),
            "fascicolo" | "fascicoli" | "folder" | "folders" => Some(Self::Folder),
            "documento" | "documenti" | "document" | "documents" => Some(Self::Document),
            _ => None,
        }
    }

    /// Zero for series, four for documents.
    pub fn depth(self) -> usize {
        self as usize
    }

    pub fn from_depth(depth: usize) -> Option<Self> {
        Self::ALL.get(depth).copied()
    }

    /// The next shallower level.
    pub fn parent(self) -> Option<Self> {
        self.depth().checked_sub(1).and_then(Self::from_depth)
    }

    /// The next deeper level.
    pub fn child(self) -> Option<Self> {
        Self::from_depth(self.depth() + 1)
    }

    pub fn class(self) -> StructuralClass {
        match self {
            Self::Document => StructuralClass::Record,
            _ => StructuralClass::RecordSet,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Series => "series",
            Self::Subseries => "subseries",
            Self::Box => "box",
            Self::Folder => "folder",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural class assigned to every row subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructuralClass {
    RecordSet,
    Record,
}

impl StructuralClass {
    /// RiC-O local name, also used as the IRI path segment for subjects.
    pub fn local_name(&self) -> &'static str {
        match self {
            Self::RecordSet => "RecordSet",
            Self::Record => "Record",
        }
    }
}

/// Where a sheet sits among the hierarchy sheets of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetPosition {
    pub index: usize,
    pub count: usize,
}

/// Resolved level and class for a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetProfile {
    pub name: String,
    pub level: HierarchyLevel,
    pub class: StructuralClass,
}

impl SheetProfile {
    pub fn resolve(name: &str, position: SheetPosition) -> Self {
        let level = level_for_sheet(name, position);
        Self {
            name: name.to_string(),
            level,
            class: level.class(),
        }
    }
}

/// Level of a sheet: by name when recognized, otherwise by position.
///
/// An unrecognized last sheet is the document level; the others take the
/// level at their index, capped at folder.
pub fn level_for_sheet(name: &str, position: SheetPosition) -> HierarchyLevel {
    if let Some(level) = HierarchyLevel::from_sheet_name(name) {
        return level;
    }
    if position.index + 1 >= position.count {
        return HierarchyLevel::Document;
    }
    HierarchyLevel::from_depth(position.index.min(HierarchyLevel::Folder.depth()))
        .unwrap_or(HierarchyLevel::Folder)
}

/// Structural class for a sheet.
pub fn classify(name: &str, position: SheetPosition) -> StructuralClass {
    level_for_sheet(name, position).class()
}

/// Outcome of a containment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// A new edge was added.
    Added,
    /// The identical edge already existed.
    Existing,
}

/// Containment tree over structural node IRIs.
///
/// Nodes carry their hierarchy level; an edge is only accepted when the
/// parent is strictly shallower than the child and the child has no other
/// parent.
#[derive(Debug, Default)]
pub struct ContainmentTree {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    levels: HashMap<String, HierarchyLevel>,
}

impl ContainmentTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, iri: &str) -> NodeIndex {
        if let Some(idx) = self.index.get(iri) {
            return *idx;
        }
        let idx = self.graph.add_node(iri.to_string());
        self.index.insert(iri.to_string(), idx);
        idx
    }

    /// Record the level of a structural node. The first declaration wins.
    pub fn declare(&mut self, iri: &str, level: HierarchyLevel) {
        self.ensure_node(iri);
        self.levels.entry(iri.to_string()).or_insert(level);
    }

    pub fn level_of(&self, iri: &str) -> Option<HierarchyLevel> {
        self.levels.get(iri).copied()
    }

    /// Add a containment edge `parent → child`.
    ///
    /// A parent not yet declared is assumed to sit one level above the
    /// child. Inversions are refused with
    /// [`Issue::HierarchyLevelInversion`]; a second, different parent is
    /// refused with [`Issue::InvariantViolation`].
    pub fn link(&mut self, parent: &str, child: &str) -> Result<Containment, Issue> {
        let child_level = self.level_of(child).ok_or_else(|| Issue::InvariantViolation {
            message: format!("containment requested for undeclared node <{child}>"),
        })?;
        let parent_level = match self.level_of(parent) {
            Some(level) => level,
            None => match child_level.parent() {
                Some(level) => level,
                None => {
                    return Err(Issue::HierarchyLevelInversion {
                        parent: parent.to_string(),
                        child: child.to_string(),
                        parent_level: child_level,
                        child_level,
                    });
                }
            },
        };

        if parent_level >= child_level {
            return Err(Issue::HierarchyLevelInversion {
                parent: parent.to_string(),
                child: child.to_string(),
                parent_level,
                child_level,
            });
        }

        if let Some(existing) = self.parent_of(child) {
            if existing == parent {
                return Ok(Containment::Existing);
            }
            return Err(Issue::InvariantViolation {
                message: format!(
                    "<{child}> is already contained in <{existing}>, refusing <{parent}>"
                ),
            });
        }

        self.declare(parent, parent_level);
        let p = self.ensure_node(parent);
        let c = self.ensure_node(child);
        self.graph.add_edge(p, c, ());
        Ok(Containment::Added)
    }

    /// The structural parent of a node, if linked.
    pub fn parent_of(&self, iri: &str) -> Option<&str> {
        let idx = *self.index.get(iri)?;
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
            .map(|p| self.graph[p].as_str())
    }

    /// Direct children of a node, in insertion order.
    pub fn children(&self, iri: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(iri) else {
            return Vec::new();
        };
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children.into_iter().map(|c| self.graph[c].as_str()).collect()
    }

    /// Direct children that sit at the record (document) level.
    pub fn record_children(&self, iri: &str) -> Vec<&str> {
        self.children(iri)
            .into_iter()
            .filter(|c| self.level_of(c).map(|l| l.class()) == Some(StructuralClass::Record))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
