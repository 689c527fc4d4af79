use crate::tree::NodeId;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum Error {
    /// The root of a map is never removable or movable.
    #[snafu(display("the map root cannot be {operation}"))]
    RootMutationRejected { operation: &'static str },

    /// An id resolved against the map arena pointed at nothing. This indicates a stale
    /// handle held across a structural edit.
    #[snafu(display("unknown node {id:?}"))]
    NodeNotFound { id: NodeId },
}
