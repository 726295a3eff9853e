//! Client tier of the taskboard application: a typed gateway over the REST
//! API, the workspace state container, and the persisted selection.

pub mod gateway;
pub mod selection;
pub mod store;

pub use gateway::{GatewayError, WorkspaceGateway};
pub use selection::SelectionStore;
pub use store::{TaskIds, WorkspaceAction, WorkspacePatch, WorkspaceStore};
