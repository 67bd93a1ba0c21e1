//! Digest + RSA signature authentication.
//!
//! The payload's canonical string is hashed with SHA-256. The Base64 of that
//! hash is the `DigestValue`; the hash bytes are then signed with RSA
//! PKCS#1 v1.5 using SHA-256 as the signature hash, and the Base64 of the
//! signature is the `SignatureValue`.

use super::{concatenate, signing_fields, Authenticator, METADATA_FIELDS};
use crate::errors::{KassaError, Result};
use crate::types::{Payload, DIGEST_VALUE, SIGNATURE_VALUE};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::der::SecretDocument;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

const PKCS8_LABEL: &str = "PRIVATE KEY";
const PKCS1_LABEL: &str = "RSA PRIVATE KEY";
const ENCRYPTED_LABEL: &str = "ENCRYPTED PRIVATE KEY";
const NON_RSA_LABELS: [&str; 2] = ["EC PRIVATE KEY", "DSA PRIVATE KEY"];

/// RSA private key of a terminal.
///
/// The key cannot be cloned or printed; its memory is zeroed on drop.
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

impl PrivateKey {
    /// Parses an unencrypted PEM key, either PKCS#8 (`PRIVATE KEY`) or
    /// PKCS#1 (`RSA PRIVATE KEY`). Text before the `-----BEGIN` line, such as
    /// the `Bag Attributes` OpenSSL writes when exporting from PKCS#12, is
    /// ignored.
    ///
    /// Fails with [`KassaError::KeyLoadError`] on malformed or encrypted input
    /// and with [`KassaError::SignatureError`] when the key is not an RSA key.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let block = pem_block(pem)
            .ok_or_else(|| KassaError::KeyLoadError("not a PEM private key".to_string()))?;
        let (label, document) = SecretDocument::from_pem(block)
            .map_err(|e| KassaError::KeyLoadError(format!("invalid PEM: {}", e)))?;

        let inner = match label {
            PKCS8_LABEL => RsaPrivateKey::from_pkcs8_der(document.as_bytes()).map_err(pkcs8_error)?,
            PKCS1_LABEL => RsaPrivateKey::from_pkcs1_der(document.as_bytes())
                .map_err(|e| KassaError::KeyLoadError(format!("invalid PKCS#1 key: {}", e)))?,
            ENCRYPTED_LABEL => {
                return Err(KassaError::KeyLoadError(
                    "encrypted private keys are not supported".to_string(),
                ))
            }
            label if NON_RSA_LABELS.contains(&label) => {
                return Err(KassaError::SignatureError(format!(
                    "{} cannot sign with RSA PKCS#1 v1.5",
                    label
                )))
            }
            label => {
                return Err(KassaError::KeyLoadError(format!(
                    "unexpected PEM label: {}",
                    label
                )))
            }
        };

        Ok(Self { inner })
    }

    /// Reads and parses a PEM key file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let pem = std::fs::read_to_string(path)
            .map(Zeroizing::new)
            .map_err(|e| KassaError::KeyLoadError(format!("{}: {}", path.display(), e)))?;
        Self::from_pem(&pem)
    }

    /// Public half of the key, for verifying signatures.
    pub fn public_key(&self) -> RsaPublicKey {
        self.inner.to_public_key()
    }

    fn sign_hash(&self, hash: &[u8]) -> Result<Vec<u8>> {
        // The hash is the signed message, so the scheme hashes it once more.
        let message_hash = Sha256::digest(hash);
        Ok(self.inner.sign(Pkcs1v15Sign::new::<Sha256>(), &message_hash)?)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

fn pkcs8_error(err: rsa::pkcs8::Error) -> KassaError {
    match err {
        rsa::pkcs8::Error::PublicKey(rsa::pkcs8::spki::Error::OidUnknown { oid, .. }) => {
            KassaError::SignatureError(format!(
                "key algorithm {} cannot sign with RSA PKCS#1 v1.5",
                oid
            ))
        }
        other => KassaError::KeyLoadError(format!("invalid PKCS#8 key: {}", other)),
    }
}

/// Cuts the first PEM block out of `text`, dropping any explanatory text
/// around it.
fn pem_block(text: &str) -> Option<&str> {
    let start = text.find("-----BEGIN ")?;
    let block = &text[start..];
    let end = block.find("-----END ")? + "-----END ".len();
    let close = block[end..].find("-----")? + end + "-----".len();
    Some(&block[..close])
}

/// Digest and signature attached to a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureArtifacts {
    /// Base64 SHA-256 of the canonical string
    pub digest_value: String,

    /// Base64 RSA PKCS#1 v1.5 / SHA-256 signature over the hash bytes
    pub signature_value: String,
}

impl SignatureArtifacts {
    /// Merges the artifacts into `payload` as `DigestValue` and `SignatureValue`.
    pub fn attach(self, payload: &mut Payload) {
        payload.insert(DIGEST_VALUE, self.digest_value);
        payload.insert(SIGNATURE_VALUE, self.signature_value);
    }
}

fn payload_hash(payload: &Payload) -> [u8; 32] {
    let canonical = concatenate(signing_fields(payload, &METADATA_FIELDS));
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(canonical.as_bytes()));
    hash
}

/// Signs a payload with an already loaded key.
pub fn sign_with_key(payload: &Payload, key: &PrivateKey) -> Result<SignatureArtifacts> {
    let hash = payload_hash(payload);
    let signature = key.sign_hash(&hash)?;

    Ok(SignatureArtifacts {
        digest_value: BASE64.encode(hash),
        signature_value: BASE64.encode(signature),
    })
}

/// Computes `DigestValue` and `SignatureValue` for a payload, reading the PEM
/// key from `key_path`.
///
/// The key is loaded completely before anything is signed, so a missing or
/// malformed file fails with [`KassaError::KeyLoadError`].
///
/// # Examples
///
/// ```no_run
/// use tinkoff_kassa::auth::generate_signature_and_digest;
/// use tinkoff_kassa::types::Payload;
///
/// let payload = Payload::new()
///     .with("TerminalKey", "T1")
///     .with("CustomerKey", "C1");
///
/// let artifacts = generate_signature_and_digest(&payload, "private.key").unwrap();
/// println!("{}", artifacts.digest_value);
/// ```
pub fn generate_signature_and_digest(
    payload: &Payload,
    key_path: impl AsRef<Path>,
) -> Result<SignatureArtifacts> {
    let key = PrivateKey::from_file(key_path)?;
    sign_with_key(payload, &key)
}

/// Checks that `artifacts` match `payload` and were produced by the private
/// half of `public_key`.
pub fn verify_signature(
    payload: &Payload,
    artifacts: &SignatureArtifacts,
    public_key: &RsaPublicKey,
) -> Result<()> {
    let hash = payload_hash(payload);
    if BASE64.encode(hash) != artifacts.digest_value {
        return Err(KassaError::SignatureError("digest does not match payload".to_string()));
    }

    let signature = BASE64
        .decode(artifacts.signature_value.as_bytes())
        .map_err(|e| KassaError::SignatureError(format!("invalid signature encoding: {}", e)))?;
    public_key.verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(hash), &signature)?;
    Ok(())
}

enum KeySource {
    Path(PathBuf),
    Loaded(PrivateKey),
}

/// [`Authenticator`] attaching `DigestValue` and `SignatureValue`.
///
/// Built from a path, the key file is read again on every request; built from
/// a [`PrivateKey`], the parsed key is reused.
pub struct DigestSigner {
    key: KeySource,
}

impl DigestSigner {
    /// Signs with the key stored at `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            key: KeySource::Path(path.into()),
        }
    }

    /// Signs with an already loaded key.
    pub fn from_key(key: PrivateKey) -> Self {
        Self {
            key: KeySource::Loaded(key),
        }
    }

    /// Computes the artifacts without touching the payload.
    pub fn sign(&self, payload: &Payload) -> Result<SignatureArtifacts> {
        match &self.key {
            KeySource::Path(path) => generate_signature_and_digest(payload, path),
            KeySource::Loaded(key) => sign_with_key(payload, key),
        }
    }
}

impl fmt::Debug for DigestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            KeySource::Path(path) => f.debug_struct("DigestSigner").field("path", path).finish(),
            KeySource::Loaded(_) => f.debug_struct("DigestSigner").field("key", &"[REDACTED]").finish(),
        }
    }
}

impl Authenticator for DigestSigner {
    fn name(&self) -> &str {
        "digest"
    }

    fn authenticate(&self, payload: &mut Payload) -> Result<()> {
        self.sign(payload)?.attach(payload);
        Ok(())
    }
}
