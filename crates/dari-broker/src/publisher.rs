use lapin::options::BasicPublishOptions;
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{BasicProperties, Channel};

pub const RETRY_COUNT_HEADER: &str = "x-retry-count";

/// Thin publisher over one channel. Messages are persistent JSON.
#[derive(Clone)]
pub struct BusPublisher {
    channel: Channel,
}

impl BusPublisher {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    pub async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        body: &[u8],
        retry_count: Option<u32>,
    ) -> Result<(), lapin::Error> {
        let mut properties = BasicProperties::default()
            .with_content_type(ShortString::from("application/json"))
            .with_delivery_mode(2);
        if let Some(count) = retry_count {
            let mut headers = FieldTable::default();
            headers.insert(
                ShortString::from(RETRY_COUNT_HEADER),
                AMQPValue::LongInt(count as i32),
            );
            properties = properties.with_headers(headers);
        }

        self.channel
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                body,
                properties,
            )
            .await?
            .await?;
        Ok(())
    }
}

/// Read `x-retry-count` off a delivery, defaulting to 0.
pub fn retry_count(properties: &BasicProperties) -> u32 {
    let Some(headers) = properties.headers() else {
        return 0;
    };
    let value = headers
        .inner()
        .iter()
        .find(|(key, _)| key.as_str() == RETRY_COUNT_HEADER)
        .map(|(_, value)| value);
    match value {
        Some(AMQPValue::LongInt(v)) => (*v).max(0) as u32,
        Some(AMQPValue::LongLongInt(v)) => (*v).max(0) as u32,
        Some(AMQPValue::ShortInt(v)) => (*v).max(0) as u32,
        Some(AMQPValue::ShortShortInt(v)) => (*v).max(0) as u32,
        _ => 0,
    }
}
