//! Private key encryption at rest.
//!
//! Keys are stored as PKCS#8 `ENCRYPTED PRIVATE KEY` PEM (PBES2 with
//! PBKDF2-SHA256 and AES-256-CBC).

use pkcs8::pkcs5::pbes2;
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo};
use tokio_rustls::rustls::pki_types::PrivatePkcs8KeyDer;

use crate::error::{BrokerError, BrokerResult};

/// PEM label of an encrypted PKCS#8 key.
pub const ENCRYPTED_KEY_LABEL: &str = "ENCRYPTED PRIVATE KEY";

/// PEM label of a plaintext PKCS#8 key.
pub const PLAIN_KEY_LABEL: &str = "PRIVATE KEY";

/// PBKDF2 iteration count for new keys.
const KDF_ITERATIONS: u32 = 100_000;

/// Encrypt a PKCS#8 DER key with `password`, returning PEM text.
pub fn encrypt_private_key(pkcs8_der: &[u8], password: &str) -> BrokerResult<String> {
    let info = PrivateKeyInfo::try_from(pkcs8_der).map_err(|e| BrokerError::Certificate {
        message: format!("Invalid private key: {}", e),
    })?;

    let salt: [u8; 16] = rand::random();
    let iv: [u8; 16] = rand::random();
    let params = pbes2::Parameters::pbkdf2_sha256_aes256cbc(KDF_ITERATIONS, &salt, &iv)
        .map_err(|e| BrokerError::Certificate {
            message: format!("Invalid key encryption parameters: {}", e),
        })?;

    let encrypted = info
        .encrypt_with_params(params, password)
        .map_err(|e| BrokerError::Certificate {
            message: format!("Failed to encrypt private key: {}", e),
        })?;

    Ok(pem::encode(&pem::Pem::new(
        ENCRYPTED_KEY_LABEL,
        encrypted.as_bytes().to_vec(),
    )))
}

/// Decode a PEM private key, decrypting it with `password` when encrypted.
///
/// A wrong password surfaces as [`BrokerError::Tls`].
pub fn decrypt_private_key(pem_text: &[u8], password: &str) -> BrokerResult<PrivatePkcs8KeyDer<'static>> {
    let parsed = pem::parse(pem_text).map_err(|e| BrokerError::Tls {
        message: format!("Invalid private key file: {}", e),
    })?;

    match parsed.tag() {
        ENCRYPTED_KEY_LABEL => {
            let info = EncryptedPrivateKeyInfo::try_from(parsed.contents()).map_err(|e| {
                BrokerError::Tls {
                    message: format!("Invalid encrypted private key: {}", e),
                }
            })?;
            let decrypted = info.decrypt(password).map_err(|e| BrokerError::Tls {
                message: format!("Failed to decrypt private key (wrong password?): {}", e),
            })?;
            Ok(PrivatePkcs8KeyDer::from(decrypted.as_bytes().to_vec()))
        }
        PLAIN_KEY_LABEL => Ok(PrivatePkcs8KeyDer::from(parsed.contents().to_vec())),
        other => Err(BrokerError::Tls {
            message: format!("Unsupported private key type: {}", other),
        }),
    }
}
