// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod conversation;
pub mod dispatch;
pub mod ids;
pub mod model;
pub mod overlay;
pub mod state;
pub mod store;
pub mod table;

pub use conversation::*;
pub use dispatch::*;
pub use ids::*;
pub use model::*;
pub use overlay::*;
pub use state::*;
pub use store::*;
pub use table::*;
