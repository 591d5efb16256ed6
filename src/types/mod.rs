pub mod chat;
pub mod location;
pub mod message;
pub mod moment;
pub mod relationship;
pub mod user;

pub use chat::{ChatMembership, ChatMeta, ChatSummary, ChatType};
pub use location::{Geofence, Location};
pub use message::{Message, MessageKind, MessageStatus};
pub use moment::{Moment, MomentComment, MomentVisibility, Reaction};
pub use relationship::{FriendRequest, Relationship, RelationshipStatus, RequestStatus};
pub use user::{Presence, User};
