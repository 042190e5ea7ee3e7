//! Thin parsing boundary between raw socket bytes and the decoded gateway
//! envelope. Kept as its own module, matching the reference crate's split
//! between frame reading and event shape, so an alternate JSON backend
//! could be substituted without touching the shard's connection loop.

use corvid_model::gateway::event::GatewayEvent;

/// Parse a decompressed frame's bytes into a [`GatewayEvent`].
pub(crate) fn parse(bytes: &[u8]) -> Result<GatewayEvent, serde_json::Error> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::parse;
    use corvid_model::gateway::event::GatewayEvent;

    #[test]
    fn parses_a_hello_frame() {
        let frame = br#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#;
        assert!(matches!(parse(frame).unwrap(), GatewayEvent::Hello(_)));
    }
}
