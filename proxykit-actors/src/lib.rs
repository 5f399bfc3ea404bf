//! Actor runtime and the background process built on it.
pub mod actor;
pub mod background;
pub mod protocol;
pub mod system;

pub use background::{
    spawn_background, ActorError, BackgroundActor, BackgroundClient, BackgroundDeps, BackgroundMsg,
};
pub use protocol::{Request, Response, UNKNOWN_ACTION};
pub use system::ActorSystem;
