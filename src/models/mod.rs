pub mod event;
pub mod position;
pub mod user;

pub use event::{ClientMessage, HubEvent};
pub use position::{Coordinates, VehiclePosition};
pub use user::{Profile, Role, RoleKind, UserFilter, UserRecord};
