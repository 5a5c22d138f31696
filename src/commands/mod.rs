pub mod generic;
pub mod geo;
pub mod info;
pub mod list;
pub mod pubsub;
pub mod replication;
pub mod sortedset;
pub mod stream;
pub mod string;

pub use generic::*;
pub use geo::*;
pub use info::*;
pub use list::*;
pub use pubsub::*;
pub use replication::*;
pub use sortedset::*;
pub use stream::*;
pub use string::*;
