//! Exchange and queue declarations.

use lapin::options::{ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions};
use lapin::types::{AMQPValue, FieldTable};
use lapin::ExchangeKind;

use courier_domain::Channel;

pub const EXCHANGE_NAME: &str = "notifications";
pub const DLX_EXCHANGE_NAME: &str = "notifications.dlx";

pub const QUEUE_SMS: &str = "notifications.sms";
pub const QUEUE_EMAIL: &str = "notifications.email";
pub const QUEUE_PUSH: &str = "notifications.push";

pub const QUEUE_SMS_DLQ: &str = "notifications.sms.dlq";
pub const QUEUE_EMAIL_DLQ: &str = "notifications.email.dlq";
pub const QUEUE_PUSH_DLQ: &str = "notifications.push.dlq";

/// Main queues with their routing keys (= channel names).
pub const MAIN_QUEUES: [(&str, &str); 3] = [
    (QUEUE_SMS, "sms"),
    (QUEUE_EMAIL, "email"),
    (QUEUE_PUSH, "push"),
];

/// Dead-letter queues with their routing keys.
pub const DLQ_QUEUES: [(&str, &str); 3] = [
    (QUEUE_SMS_DLQ, "sms"),
    (QUEUE_EMAIL_DLQ, "email"),
    (QUEUE_PUSH_DLQ, "push"),
];

const MAX_PRIORITY: i32 = 4;

/// The main queue a channel's notifications land in.
pub fn queue_for_channel(channel: Channel) -> &'static str {
    match channel {
        Channel::Sms => QUEUE_SMS,
        Channel::Email => QUEUE_EMAIL,
        Channel::Push => QUEUE_PUSH,
    }
}

/// Declare the full topology. Declarations are idempotent; this runs at
/// every startup and after every reconnect.
pub async fn declare_topology(channel: &lapin::Channel) -> Result<(), lapin::Error> {
    let durable = ExchangeDeclareOptions {
        durable: true,
        ..Default::default()
    };
    channel
        .exchange_declare(
            EXCHANGE_NAME,
            ExchangeKind::Topic,
            durable,
            FieldTable::default(),
        )
        .await?;
    channel
        .exchange_declare(
            DLX_EXCHANGE_NAME,
            ExchangeKind::Topic,
            durable,
            FieldTable::default(),
        )
        .await?;

    let durable_queue = QueueDeclareOptions {
        durable: true,
        ..Default::default()
    };

    for (queue, routing_key) in MAIN_QUEUES {
        let mut args = FieldTable::default();
        args.insert("x-max-priority".into(), AMQPValue::LongInt(MAX_PRIORITY));
        args.insert(
            "x-dead-letter-exchange".into(),
            AMQPValue::LongString(DLX_EXCHANGE_NAME.into()),
        );
        channel.queue_declare(queue, durable_queue, args).await?;
        channel
            .queue_bind(
                queue,
                EXCHANGE_NAME,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
    }

    for (queue, routing_key) in DLQ_QUEUES {
        channel
            .queue_declare(queue, durable_queue, FieldTable::default())
            .await?;
        channel
            .queue_bind(
                queue,
                DLX_EXCHANGE_NAME,
                routing_key,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;
    }

    Ok(())
}
