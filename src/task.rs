//! Publish task and partition key strategy
//!
//! A `PublishTask` is one formatted record waiting for a worker. It is
//! immutable once created: the queue owns it until a worker claims it, then
//! ownership moves into the worker for the duration of the outbound call.

use bytes::Bytes;

/// One unit of publish work: a formatted payload plus optional routing key
///
/// Exclusively owned: created by `append`, held by the queue, moved into
/// the claiming worker, dropped on completion.
#[derive(Debug)]
pub struct PublishTask {
    /// Formatted record bytes
    payload: Bytes,

    /// Partition/routing key forwarded to the ingestion client
    partition_key: Option<String>,
}

impl PublishTask {
    /// Create a new task
    pub fn new(payload: Bytes, partition_key: Option<String>) -> Self {
        Self {
            payload,
            partition_key,
        }
    }

    /// Payload bytes
    #[inline]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Partition key, if any
    #[inline]
    pub fn partition_key(&self) -> Option<&str> {
        self.partition_key.as_deref()
    }

    /// Payload size in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Split into payload and partition key for the outbound call
    pub fn into_parts(self) -> (Bytes, Option<String>) {
        (self.payload, self.partition_key)
    }
}

/// How partition keys are assigned to outgoing records
///
/// The default assigns a fresh random UUID per record, spreading records
/// evenly across shards of the destination stream.
#[derive(Debug, Clone, Default)]
pub enum KeyStrategy {
    /// Random UUID v4 per record
    #[default]
    RandomUuid,

    /// The same fixed key for every record
    Fixed(String),

    /// No partition key (destinations that do their own partitioning)
    None,
}

impl KeyStrategy {
    /// Produce the key for the next record
    pub fn next_key(&self) -> Option<String> {
        match self {
            Self::RandomUuid => Some(uuid::Uuid::new_v4().to_string()),
            Self::Fixed(key) => Some(key.clone()),
            Self::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_accessors() {
        let task = PublishTask::new(Bytes::from_static(b"hello"), Some("k1".into()));
        assert_eq!(task.payload().as_ref(), b"hello");
        assert_eq!(task.partition_key(), Some("k1"));
        assert_eq!(task.len(), 5);
        assert!(!task.is_empty());

        let (payload, key) = task.into_parts();
        assert_eq!(payload.as_ref(), b"hello");
        assert_eq!(key.as_deref(), Some("k1"));
    }

    #[test]
    fn test_random_uuid_keys_differ() {
        let strategy = KeyStrategy::RandomUuid;
        let a = strategy.next_key().unwrap();
        let b = strategy.next_key().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_fixed_key() {
        let strategy = KeyStrategy::Fixed("shard-7".into());
        assert_eq!(strategy.next_key().as_deref(), Some("shard-7"));
        assert_eq!(strategy.next_key().as_deref(), Some("shard-7"));
    }

    #[test]
    fn test_no_key() {
        assert_eq!(KeyStrategy::None.next_key(), None);
    }

    #[test]
    fn test_default_is_random() {
        assert!(matches!(KeyStrategy::default(), KeyStrategy::RandomUuid));
    }
}
