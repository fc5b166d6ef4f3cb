use tandem_shared::{ClientMessage, Tick};

/// Narrow interface onto the transport collaborator. Wire encoding, channel
/// reliability and ordering are its concern; the engine only assumes
/// ordered, at-most-once delivery per logical channel.
pub trait Transport {
    /// Whether a session has been established (assignment traffic allowed).
    fn is_online(&self) -> bool;

    /// Whether the underlying connection is currently open.
    fn is_connected(&self) -> bool;

    /// Current tick of the shared session clock, in milliseconds.
    fn current_tick(&self) -> Tick;

    fn connect(&mut self, address: &str);

    fn close(&mut self);

    /// Hands a message to the transport. Returns whether it was accepted for
    /// sending; callers treat `false` as "retry later", never as fatal.
    fn send(&mut self, message: ClientMessage) -> bool;
}
