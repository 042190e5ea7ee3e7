//! Interaction webhook receiver.
//!
//! Discord can deliver interactions either over the gateway or as signed
//! HTTP requests to a configured endpoint. [`Receiver`] verifies the
//! ed25519 signature Discord attaches to each request and decodes the body
//! into the same [`Interaction`](corvid_model::application::Interaction)
//! type the gateway dispatch path produces, so a handler doesn't need to
//! care which surface delivered it.
//!
//! This crate is transport-agnostic: [`Receiver::receive`] takes raw header
//! values and a body and returns the bytes to send back, leaving the HTTP
//! server to whatever the embedder already runs. An optional hyper-based
//! convenience server is available behind the `server` feature.

mod error;

#[cfg(feature = "server")]
mod server;

pub use error::{Error, ErrorType, Result};
#[cfg(feature = "server")]
pub use server::serve;

use corvid_model::application::{Interaction, InteractionResponse, InteractionType};
use ed25519_dalek::{Signature, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};

/// Name of the header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";
/// Name of the header carrying the timestamp the signature covers.
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

/// Verifies and decodes interaction webhook requests against a single
/// application's public key.
#[derive(Clone, Debug)]
pub struct Receiver {
    public_key: VerifyingKey,
}

impl Receiver {
    /// Builds a receiver from the application's public key, as given by
    /// Discord in hexadecimal.
    pub fn new(public_key_hex: &str) -> Result<Self> {
        let bytes = decode_fixed::<PUBLIC_KEY_LENGTH>(public_key_hex)?;
        let public_key = VerifyingKey::from_bytes(&bytes)
            .map_err(|source| Error::new(ErrorType::InvalidPublicKey, Some(Box::new(source))))?;

        Ok(Self { public_key })
    }

    /// Verifies `signature_hex` over `timestamp || body`.
    ///
    /// `timestamp` and `signature_hex` are the raw values of the
    /// [`TIMESTAMP_HEADER`] and [`SIGNATURE_HEADER`] headers.
    pub fn verify(&self, timestamp: &str, signature_hex: &str, body: &[u8]) -> Result<()> {
        let signature = Signature::from_bytes(&decode_fixed::<SIGNATURE_LENGTH>(signature_hex)?);

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        self.public_key
            .verify(&message, &signature)
            .map_err(|_| Error::verification())
    }

    /// Verifies `signature_hex`, decodes `body` into an [`Interaction`], and
    /// runs `handler` unless the interaction is a `Ping` (which is answered
    /// with `Pong` directly). Returns the serialized response body.
    ///
    /// `handler` is called synchronously; spawning onto a runtime, if
    /// needed, is the caller's responsibility.
    pub fn receive(
        &self,
        timestamp: &str,
        signature_hex: &str,
        body: &[u8],
        handler: impl FnOnce(Interaction) -> InteractionResponse,
    ) -> Result<Vec<u8>> {
        self.verify(timestamp, signature_hex, body)?;

        let interaction: Interaction = serde_json::from_slice(body).map_err(Error::body)?;

        let response = match interaction.kind {
            InteractionType::Ping => InteractionResponse::Pong,
            _ => handler(interaction),
        };

        serde_json::to_vec(&response).map_err(Error::body)
    }
}

fn decode_fixed<const N: usize>(hex_str: &str) -> Result<[u8; N]> {
    let bytes = hex::decode(hex_str).map_err(Error::signature_encoding)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| Error::signature_length(len))
}

#[cfg(test)]
mod tests {
    use super::{Receiver, SIGNATURE_HEADER, TIMESTAMP_HEADER};
    use corvid_model::application::{Interaction, InteractionResponse, InteractionType};
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, Receiver) {
        let signing_key = SigningKey::from_bytes(&[7; 32]);
        let public_key_hex = hex::encode(signing_key.verifying_key().to_bytes());
        (signing_key, Receiver::new(&public_key_hex).unwrap())
    }

    fn sign(signing_key: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(signing_key.sign(&message).to_bytes())
    }

    #[test]
    fn valid_signature_verifies() {
        let (signing_key, receiver) = keypair();
        let body = br#"{"type":1}"#;
        let signature = sign(&signing_key, "1000", body);

        assert!(receiver.verify("1000", &signature, body).is_ok());
    }

    #[test]
    fn tampered_body_fails_verification() {
        let (signing_key, receiver) = keypair();
        let signature = sign(&signing_key, "1000", br#"{"type":1}"#);

        assert!(receiver
            .verify("1000", &signature, br#"{"type":2}"#)
            .is_err());
    }

    #[test]
    fn non_hex_signature_is_rejected() {
        let (_signing_key, receiver) = keypair();
        assert!(receiver.verify("1000", "not hex", b"body").is_err());
    }

    #[test]
    fn ping_is_answered_without_invoking_the_handler() {
        let (signing_key, receiver) = keypair();
        let body = br#"{"id":"1","application_id":"2","type":1,"token":"t","version":1}"#;
        let signature = sign(&signing_key, "1000", body);

        let mut called = false;
        let response_json = receiver
            .receive("1000", &signature, body, |_| {
                called = true;
                unreachable!("ping must not reach the handler")
            })
            .unwrap();

        assert!(!called);
        let response: InteractionResponse = serde_json::from_slice(&response_json).unwrap();
        assert_eq!(response, InteractionResponse::Pong);
    }

    #[test]
    fn invalid_signature_does_not_reach_the_handler() {
        let (_signing_key, receiver) = keypair();
        let body = br#"{"id":"1","application_id":"2","type":1,"token":"t","version":1}"#;

        let err = receiver
            .receive("1000", &hex::encode([0u8; 64]), body, |_: Interaction| {
                unreachable!("bad signature must not reach the handler")
            })
            .unwrap_err();

        assert!(matches!(err.kind(), super::ErrorType::Verification));
    }

    #[test]
    fn application_command_invokes_the_handler() {
        let (signing_key, receiver) = keypair();
        let body = br#"{"id":"1","application_id":"2","type":2,"token":"t","version":1}"#;
        let signature = sign(&signing_key, "1000", body);

        let response_json = receiver
            .receive("1000", &signature, body, |interaction| {
                assert_eq!(interaction.kind, InteractionType::ApplicationCommand);
                InteractionResponse::DeferredChannelMessageWithSource
            })
            .unwrap();

        let response: InteractionResponse = serde_json::from_slice(&response_json).unwrap();
        assert_eq!(response, InteractionResponse::DeferredChannelMessageWithSource);
    }

    #[test]
    fn header_signature_name_matches_discords_convention() {
        assert_eq!(SIGNATURE_HEADER, "X-Signature-Ed25519");
        assert_eq!(TIMESTAMP_HEADER, "X-Signature-Timestamp");
    }
}
