use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use thiserror::Error;

use crate::error::IngressError;

pub const SIGNATURE_HEADER: &str = "X-Signature-Ed25519";
pub const TIMESTAMP_HEADER: &str = "X-Signature-Timestamp";

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("public key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("public key must be {PUBLIC_KEY_LENGTH} bytes (got {0})")]
    Length(usize),
    #[error("public key is not a valid ed25519 point")]
    Point,
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("missing public key")]
pub struct MissingPublicKey;

/// The pieces of a request covered by the platform signature. Built only once the method
/// and both signature headers have been checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignedRequest<'a> {
    pub signature: &'a str,
    pub timestamp: &'a str,
    pub body: &'a [u8],
}

impl<'a> SignedRequest<'a> {
    pub fn from_parts(
        method: &str,
        signature: Option<&'a str>,
        timestamp: Option<&'a str>,
        body: &'a [u8],
    ) -> Result<Self, IngressError> {
        if !method.eq_ignore_ascii_case("POST") {
            return Err(IngressError::MethodNotAllowed(method.to_owned()));
        }
        let signature = signature
            .filter(|value| !value.is_empty())
            .ok_or(IngressError::MissingHeader(SIGNATURE_HEADER))?;
        let timestamp = timestamp
            .filter(|value| !value.is_empty())
            .ok_or(IngressError::MissingHeader(TIMESTAMP_HEADER))?;

        Ok(Self { signature, timestamp, body })
    }
}

/// Result of checking a signature. The body is only handed out when the check passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerificationOutcome<'a> {
    is_valid: bool,
    body: &'a [u8],
}

impl<'a> VerificationOutcome<'a> {
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn trusted_body(&self) -> Option<&'a [u8]> {
        self.is_valid.then_some(self.body)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SignatureVerifier {
    public_key: Option<VerifyingKey>,
}

impl SignatureVerifier {
    pub fn new(public_key: Option<VerifyingKey>) -> Self {
        Self { public_key }
    }

    pub fn from_hex(public_key: Option<&str>) -> Result<Self, KeyError> {
        let Some(raw) = public_key else {
            return Ok(Self::new(None));
        };

        let bytes = hex::decode(raw.trim())?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            bytes.as_slice().try_into().map_err(|_| KeyError::Length(bytes.len()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::Point)?;
        Ok(Self::new(Some(key)))
    }

    pub fn is_configured(&self) -> bool {
        self.public_key.is_some()
    }

    pub fn verify<'a>(
        &self,
        request: SignedRequest<'a>,
    ) -> Result<VerificationOutcome<'a>, MissingPublicKey> {
        let public_key = self.public_key.as_ref().ok_or(MissingPublicKey)?;
        Ok(VerificationOutcome {
            is_valid: signature_matches(public_key, &request),
            body: request.body,
        })
    }
}

fn signature_matches(public_key: &VerifyingKey, request: &SignedRequest<'_>) -> bool {
    let Ok(raw) = hex::decode(request.signature) else {
        return false;
    };
    let Ok(bytes) = <[u8; SIGNATURE_LENGTH]>::try_from(raw.as_slice()) else {
        return false;
    };
    let signature = Signature::from_bytes(&bytes);

    let mut message = Vec::with_capacity(request.timestamp.len() + request.body.len());
    message.extend_from_slice(request.timestamp.as_bytes());
    message.extend_from_slice(request.body);

    public_key.verify_strict(&message, &signature).is_ok()
}
