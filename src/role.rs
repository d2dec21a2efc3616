use std::fmt;


// Assigned once, when the channel is established. Never changes for the session lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PeerRole {
    // Accepted the inbound connection. Controls match settings and starts the game. The owner's
    // view of settings is the source of truth: it is sent to the joiner on game start.
    Owner,

    // Initiated the outbound connection. Adopts whatever settings the owner sends.
    Joiner,
}

impl fmt::Display for PeerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerRole::Owner => write!(f, "room owner"),
            PeerRole::Joiner => write!(f, "joiner"),
        }
    }
}
