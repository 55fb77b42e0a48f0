//! Certificate material: validated or generated once per server.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{SubjectFields, TlsSettings};
use crate::console::Console;
use crate::error::{BrokerError, BrokerResult};
use crate::prompt::Prompt;

use super::generate::{generate_self_signed, CertificateSubject};
use super::key::encrypt_private_key;

/// Prompt shown when no key password was supplied.
pub const PASSWORD_PROMPT: &str = "Enter password for key: ";

/// Paths to a certificate and encrypted key, plus the key's password.
#[derive(Clone)]
pub struct CertificateMaterial {
    cert_path: PathBuf,
    key_path: PathBuf,
    password: String,
}

impl std::fmt::Debug for CertificateMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateMaterial")
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl CertificateMaterial {
    /// Make sure a usable certificate, key, and password exist.
    ///
    /// Resolves the password (prompting if needed), then either checks that
    /// both files exist or generates a self-signed pair for `address`.
    pub fn bootstrap(
        address: &str,
        settings: &TlsSettings,
        prompt: &dyn Prompt,
        console: &Console,
    ) -> BrokerResult<Self> {
        let password = resolve_password(settings.password.as_deref(), prompt)?;

        let material = Self {
            cert_path: settings.cert_path.clone(),
            key_path: settings.key_path.clone(),
            password,
        };

        if settings.generate {
            let subject = resolve_subject(address, &settings.subject, prompt)?;
            material.generate(&subject, settings.validity_days)?;
            console.say(format!(
                "Generated certificate {} and key {}.",
                material.cert_path.display(),
                material.key_path.display()
            ));
        } else if !material.cert_path.exists() || !material.key_path.exists() {
            return Err(BrokerError::SslFilesMissing {
                cert: material.cert_path.clone(),
                key: material.key_path.clone(),
            });
        }

        Ok(material)
    }

    /// Path to the PEM certificate.
    pub fn cert_path(&self) -> &Path {
        &self.cert_path
    }

    /// Path to the encrypted PEM key.
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Password protecting the key.
    pub fn password(&self) -> &str {
        &self.password
    }

    fn generate(&self, subject: &CertificateSubject, validity_days: u32) -> BrokerResult<()> {
        let generated = generate_self_signed(subject, validity_days)?;
        let key_pem = encrypt_private_key(&generated.key_pkcs8_der, &self.password)?;

        write_file(&self.cert_path, generated.cert_pem.as_bytes())?;
        write_file(&self.key_path, key_pem.as_bytes())?;
        restrict_permissions(&self.key_path)?;

        info!(
            cert = %self.cert_path.display(),
            key = %self.key_path.display(),
            common_name = %subject.common_name,
            validity_days,
            "Generated self-signed certificate"
        );
        Ok(())
    }
}

fn resolve_password(supplied: Option<&str>, prompt: &dyn Prompt) -> BrokerResult<String> {
    let password = match supplied {
        Some(password) => password.to_string(),
        None => prompt.read_password(PASSWORD_PROMPT)?,
    };
    if password.is_empty() {
        return Err(BrokerError::EmptyPassword);
    }
    Ok(password)
}

fn resolve_subject(
    address: &str,
    fields: &SubjectFields,
    prompt: &dyn Prompt,
) -> BrokerResult<CertificateSubject> {
    let ask = |value: &Option<String>, field: &str| -> BrokerResult<String> {
        match value {
            Some(value) => Ok(value.clone()),
            None => prompt.read_line(&format!("Enter the {} for the certificate: ", field)),
        }
    };

    Ok(CertificateSubject {
        country: ask(&fields.country, "country")?,
        state: ask(&fields.state, "state")?,
        locality: ask(&fields.locality, "locality")?,
        organization: ask(&fields.organization, "organization")?,
        common_name: address.to_string(),
    })
}

fn write_file(path: &Path, contents: &[u8]) -> BrokerResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| BrokerError::Certificate {
            message: format!("Failed to create directory {}: {}", parent.display(), e),
        })?;
    }
    fs::write(path, contents).map_err(|e| BrokerError::Certificate {
        message: format!("Failed to write {}: {}", path.display(), e),
    })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> BrokerResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
        BrokerError::Certificate {
            message: format!("Failed to set permissions on {}: {}", path.display(), e),
        }
    })
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> BrokerResult<()> {
    Ok(())
}
