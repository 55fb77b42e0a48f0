//! TLS support: certificate bootstrap and rustls contexts.
//!
//! The server owns a [`CertificateMaterial`] (certificate, encrypted key,
//! password) that is either loaded from disk or generated as a self-signed
//! pair. Clients pin that exact certificate through [`TrustPolicy::Pinned`].

mod context;
mod generate;
mod key;
mod material;

pub use context::{client_connector, load_certificates, server_acceptor, server_name, TrustPolicy};
pub use generate::{generate_self_signed, subject_alt_name, CertificateSubject, SelfSignedCertificate};
pub use key::{decrypt_private_key, encrypt_private_key, ENCRYPTED_KEY_LABEL, PLAIN_KEY_LABEL};
pub use material::{CertificateMaterial, PASSWORD_PROMPT};
