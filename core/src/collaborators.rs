//! Boundaries to the components the engine does not own: selection, the
//! pending origin (context menu), and the tabular view of the dataset.
//!
//! Each boundary is a trait; the structs here are plain in-memory versions
//! used by embedders that have no richer UI layer, and by the tests.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::FilterResult;
use crate::model::{EntryId, NodeId};

/// Owner of the node selection.
pub trait SelectionSource {
    /// Selected node ids, in selection order.
    fn selected_node_ids(&self) -> Vec<NodeId>;

    /// Flip the selection state of `id`.
    fn toggle_selection(&mut self, id: NodeId);
}

/// Supplies a node to adopt as origin when none is set (e.g. the node a
/// context menu was opened on).
pub trait OriginSource {
    fn pending_origin_node(&self) -> Option<NodeId>;

    /// Called once the engine has adopted the pending node.
    fn dismiss(&mut self);
}

/// Which rows a table view should show.
#[derive(Debug, Clone, Copy)]
pub enum RowFilter<'a> {
    All,
    /// Rows whose provenance entry is in the set.
    Entries(&'a BTreeSet<EntryId>),
}

impl RowFilter<'_> {
    pub fn accepts(&self, entry: &str) -> bool {
        match self {
            RowFilter::All => true,
            RowFilter::Entries(entries) => entries.contains(entry),
        }
    }
}

/// Tabular view of the dataset's source records.
pub trait TableView {
    fn set_visible_rows(&mut self, filter: RowFilter<'_>);
}

impl<T: SelectionSource + ?Sized> SelectionSource for &mut T {
    fn selected_node_ids(&self) -> Vec<NodeId> {
        (**self).selected_node_ids()
    }

    fn toggle_selection(&mut self, id: NodeId) {
        (**self).toggle_selection(id)
    }
}

impl<T: OriginSource + ?Sized> OriginSource for &mut T {
    fn pending_origin_node(&self) -> Option<NodeId> {
        (**self).pending_origin_node()
    }

    fn dismiss(&mut self) {
        (**self).dismiss()
    }
}

impl<T: TableView + ?Sized> TableView for &mut T {
    fn set_visible_rows(&mut self, filter: RowFilter<'_>) {
        (**self).set_visible_rows(filter)
    }
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// Ordered selection with toggle semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<NodeId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Duplicate ids keep their first position.
    pub fn from_ids<I: IntoIterator<Item = NodeId>>(ids: I) -> Self {
        let mut set = Self::new();
        for id in ids {
            if !set.contains(id) {
                set.ids.push(id);
            }
        }
        set
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

impl SelectionSource for SelectionSet {
    fn selected_node_ids(&self) -> Vec<NodeId> {
        self.ids.clone()
    }

    fn toggle_selection(&mut self, id: NodeId) {
        match self.ids.iter().position(|&s| s == id) {
            Some(pos) => {
                self.ids.remove(pos);
            }
            None => self.ids.push(id),
        }
    }
}

/// At most one pending origin; `dismiss` clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingOrigin(Option<NodeId>);

impl PendingOrigin {
    pub fn new() -> Self {
        Self(None)
    }

    pub fn set(&mut self, id: NodeId) {
        self.0 = Some(id);
    }
}

impl OriginSource for PendingOrigin {
    fn pending_origin_node(&self) -> Option<NodeId> {
        self.0
    }

    fn dismiss(&mut self) {
        self.0 = None;
    }
}

/// One source record shown in the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub entry: EntryId,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// All rows of the dataset plus the currently active subset.
#[derive(Debug, Clone, Default)]
pub struct TableRows {
    rows: Vec<TableRow>,
    active: Vec<usize>,
}

impl TableRows {
    pub fn new(rows: Vec<TableRow>) -> Self {
        let active = (0..rows.len()).collect();
        Self { rows, active }
    }

    /// Parse a JSON array of row objects, each carrying an `entry` key.
    pub fn from_json(json: &str) -> FilterResult<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn active_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.active.iter().map(move |&i| &self.rows[i])
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

impl TableView for TableRows {
    fn set_visible_rows(&mut self, filter: RowFilter<'_>) {
        self.active = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| filter.accepts(&row.entry))
            .map(|(i, _)| i)
            .collect();
    }
}
