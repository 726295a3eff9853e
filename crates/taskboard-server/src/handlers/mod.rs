pub mod events;
pub mod workspaces;
