//! The two `Event` shapes: the publisher emits one kind, the subscriber
//! decodes it into a richer kind carrying the sender's address.

/// A single append observed on a watched file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherEvent {
    pub name: String,
    pub location: String,
    pub description: String,
}

impl PublisherEvent {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            description: description.into(),
        }
    }
}

/// A decoded event as seen by a subscriber, with the publisher's address
/// and port attached by the connection that received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEvent {
    pub name: String,
    pub location: String,
    pub description: String,
    pub sender_address: String,
    pub sender_port: String,
}
