//! rustls configuration for both ends of a connection.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_rustls::rustls::crypto::{aws_lc_rs, CryptoProvider};
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use tokio_rustls::rustls::{ClientConfig, RootCertStore, ServerConfig};
use tokio_rustls::{TlsAcceptor, TlsConnector};
use tracing::debug;

use crate::error::{BrokerError, BrokerResult};

use super::key::decrypt_private_key;
use super::material::CertificateMaterial;

/// Which certificates a client accepts from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Trust exactly the certificates in this PEM file and nothing else.
    /// No system certificate authorities are consulted.
    Pinned(PathBuf),
}

fn provider() -> Arc<CryptoProvider> {
    Arc::new(aws_lc_rs::default_provider())
}

fn tls_error(context: &str, e: impl std::fmt::Display) -> BrokerError {
    BrokerError::Tls {
        message: format!("{}: {}", context, e),
    }
}

/// Load every certificate in a PEM file.
pub fn load_certificates(path: &Path) -> BrokerResult<Vec<CertificateDer<'static>>> {
    let file = File::open(path)
        .map_err(|e| tls_error(&format!("Failed to open {}", path.display()), e))?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| tls_error(&format!("Failed to read {}", path.display()), e))?;

    if certs.is_empty() {
        return Err(BrokerError::Tls {
            message: format!("No certificates found in {}", path.display()),
        });
    }
    Ok(certs)
}

/// Build the server-side acceptor, decrypting the key with the material's password.
pub fn server_acceptor(material: &CertificateMaterial) -> BrokerResult<TlsAcceptor> {
    let certs = load_certificates(material.cert_path())?;

    let key_pem = std::fs::read(material.key_path()).map_err(|e| {
        tls_error(&format!("Failed to read {}", material.key_path().display()), e)
    })?;
    let key = decrypt_private_key(&key_pem, material.password())?;

    let config = ServerConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| tls_error("Unsupported protocol versions", e))?
        .with_no_client_auth()
        .with_single_cert(certs, PrivateKeyDer::Pkcs8(key))
        .map_err(|e| tls_error("Certificate and key do not form a usable pair", e))?;

    debug!(cert = %material.cert_path().display(), "Server TLS context ready");
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Build the client-side connector for a trust policy.
pub fn client_connector(policy: &TrustPolicy) -> BrokerResult<TlsConnector> {
    let mut roots = RootCertStore::empty();
    match policy {
        TrustPolicy::Pinned(path) => {
            for cert in load_certificates(path)? {
                roots
                    .add(cert)
                    .map_err(|e| tls_error(&format!("Untrusted certificate in {}", path.display()), e))?;
            }
        }
    }

    let config = ClientConfig::builder_with_provider(provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| tls_error("Unsupported protocol versions", e))?
        .with_root_certificates(roots)
        .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Server name to verify for an address: an IP literal or a DNS name.
pub fn server_name(address: &str) -> BrokerResult<ServerName<'static>> {
    ServerName::try_from(address.to_string())
        .map_err(|e| tls_error(&format!("Invalid server name {:?}", address), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SubjectFields, TlsSettings};
    use crate::console::Console;
    use crate::prompt::ScriptedPrompt;
    use tempfile::TempDir;

    fn generated_material(dir: &TempDir, password: &str) -> CertificateMaterial {
        let settings = TlsSettings {
            cert_path: dir.path().join("cert.pem"),
            key_path: dir.path().join("key.pem"),
            password: Some(password.to_string()),
            generate: true,
            subject: SubjectFields {
                country: Some("US".to_string()),
                state: Some("CA".to_string()),
                locality: Some("San Francisco".to_string()),
                organization: Some("Test Organization".to_string()),
            },
            validity_days: 1,
        };
        CertificateMaterial::bootstrap(
            "127.0.0.1",
            &settings,
            &ScriptedPrompt::empty(),
            &Console::buffer().0,
        )
        .unwrap()
    }

    #[test]
    fn test_server_acceptor_builds() {
        let dir = TempDir::new().unwrap();
        let material = generated_material(&dir, "test-password");
        assert!(server_acceptor(&material).is_ok());
    }

    #[test]
    fn test_server_acceptor_bad_password() {
        let dir = TempDir::new().unwrap();
        generated_material(&dir, "test-password");

        let wrong = CertificateMaterial::bootstrap(
            "127.0.0.1",
            &TlsSettings {
                cert_path: dir.path().join("cert.pem"),
                key_path: dir.path().join("key.pem"),
                password: Some("wrong-password".to_string()),
                generate: false,
                subject: SubjectFields::default(),
                validity_days: 1,
            },
            &ScriptedPrompt::empty(),
            &Console::buffer().0,
        )
        .unwrap();

        assert!(matches!(
            server_acceptor(&wrong),
            Err(BrokerError::Tls { .. })
        ));
    }

    #[test]
    fn test_client_connector_pins_certificate() {
        let dir = TempDir::new().unwrap();
        let material = generated_material(&dir, "test-password");
        let policy = TrustPolicy::Pinned(material.cert_path().to_path_buf());
        assert!(client_connector(&policy).is_ok());
    }

    #[test]
    fn test_client_connector_empty_cert_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.pem");
        std::fs::write(&path, "").unwrap();

        assert!(matches!(
            client_connector(&TrustPolicy::Pinned(path)),
            Err(BrokerError::Tls { .. })
        ));
    }

    #[test]
    fn test_server_name_kinds() {
        assert!(matches!(server_name("127.0.0.1").unwrap(), ServerName::IpAddress(_)));
        assert!(matches!(server_name("localhost").unwrap(), ServerName::DnsName(_)));
        assert!(server_name("not a hostname!").is_err());
    }
}
