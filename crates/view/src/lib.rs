//! kindlens view: schema tree and results table renderers plus the session that
//! drives them from host events. No GUI toolkit here; front-ends paint the
//! render models this crate produces.

#![forbid(unsafe_code)]

pub mod bridge;
pub mod catalog;
pub mod grid;
pub mod session;
pub mod table;
pub mod tree;

pub use bridge::{channel, Bridge};
pub use catalog::{CatalogMatch, CatalogState};
pub use grid::{BodyRow, HeaderCell, RowAction, SortIndicator, TableView, ACTIONS_LABEL, OPEN_YAML};
pub use session::{Phase, ViewConfig, ViewSession};
pub use table::{Ingest, TableState};
pub use tree::{NodePath, TreeLine, TreeView};
