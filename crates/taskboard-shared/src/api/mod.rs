mod workspaces;

pub use workspaces::*;
