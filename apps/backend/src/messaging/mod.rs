pub mod bus;
pub mod publisher;
pub mod session_consumer;

pub use bus::{spawn_consumer, ConsumerConfig, EventBus, EventHandler};
pub use publisher::{BusPublisher, EventPublisher, NullPublisher};
pub use session_consumer::SessionStartConsumer;
