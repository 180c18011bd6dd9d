pub mod models;
pub mod transport;

pub use models::{AttendanceRecord, Member, Occurrence, Presence};
pub use transport::{
    DirectoryEntry, MemberInfo, PostedMessage, ReactionGroup, TransportError,
};
