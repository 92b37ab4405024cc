//! Client fan-out: broadcast hub, client sinks, registry, transports, lifecycle edges.

pub mod broadcast;
pub mod lifecycle;
pub mod registry;
pub mod sink;
pub mod transport;

pub use broadcast::{BroadcastHub, ClientHandle, PublishReport};
pub use lifecycle::{LifecycleEvent, LifecycleListener};
pub use sink::{ClientInfo, ClientSink, Offer};
pub use transport::{ChannelTransport, FrameTransport};
