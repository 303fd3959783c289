//! RabbitMQ adapters.
//!
//! One topic exchange fans notifications out to a durable priority queue per
//! channel; a dead-letter exchange mirrors the layout for exhausted or
//! unparseable messages. The publisher and the consumer both declare the
//! topology at startup (and after every reconnect) so either side can boot
//! first.

mod consumer;
mod management;
mod publisher;
mod topology;

pub use consumer::{EventHandler, RabbitMqConsumer};
pub use management::{ManagementClient, QueueDepth};
pub use publisher::RabbitMqPublisher;
pub use topology::{
    declare_topology, queue_for_channel, EXCHANGE_NAME, DLX_EXCHANGE_NAME, MAIN_QUEUES, DLQ_QUEUES,
};
