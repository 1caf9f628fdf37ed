//! Channel credentials
//!
//! The TLS decision is keyed on three inputs: `tls`, a pinned CA path, and a
//! certificate name override. [`TransportPlan`] spells out every meaningful
//! combination so each one can be selected and tested on its own, and
//! [`TransportCredential::build`] turns a plan into something the dialer can use.

use std::io::BufReader;
use std::path::{Path, PathBuf};

use tonic::transport::{Certificate, ClientTlsConfig};

use crate::config::ProbeConfig;
use crate::error::{Error, Result};

/// Which transport a probe will use
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportPlan {
    /// No TLS
    Plaintext,
    /// TLS verified against the platform's native roots
    PlatformRoots,
    /// TLS verified against native roots, using `server_name` for name checks
    PlatformRootsAs { server_name: String },
    /// TLS trusting only the certificates in `ca_cert`
    PinnedCa { ca_cert: PathBuf },
    /// TLS trusting only `ca_cert`, using `server_name` for name checks
    PinnedCaAs { ca_cert: PathBuf, server_name: String },
}

impl TransportPlan {
    /// Choose the plan for a configuration
    ///
    /// Without `tls` the CA and name settings are dropped with a warning;
    /// they never turn TLS on.
    pub fn select(config: &ProbeConfig) -> Self {
        let ca_cert = config.ca_cert.clone();
        let server_name = config.ca_name.clone().filter(|name| !name.is_empty());

        if !config.tls {
            if ca_cert.is_some() || server_name.is_some() {
                tracing::warn!(
                    ca_cert = ?ca_cert,
                    ca_name = ?server_name,
                    "TLS is disabled, ignoring CA certificate and name override"
                );
            }
            return Self::Plaintext;
        }

        match (ca_cert, server_name) {
            (None, None) => Self::PlatformRoots,
            (None, Some(server_name)) => Self::PlatformRootsAs { server_name },
            (Some(ca_cert), None) => Self::PinnedCa { ca_cert },
            (Some(ca_cert), Some(server_name)) => Self::PinnedCaAs { ca_cert, server_name },
        }
    }

    /// Whether the plan dials with TLS
    pub fn is_tls(&self) -> bool {
        !matches!(self, Self::Plaintext)
    }
}

/// Roots a TLS credential trusts
#[derive(Debug, Clone)]
pub enum TrustRoot {
    /// The platform's native certificate store
    Platform,
    /// Only the PEM bundle read from `path`
    Pinned { path: PathBuf, pem: Vec<u8> },
}

/// Credential handed to the dialer
#[derive(Debug, Clone)]
pub enum TransportCredential {
    /// Plaintext HTTP/2
    Insecure,
    /// TLS with the given roots and optional name override
    Tls {
        roots: TrustRoot,
        server_name: Option<String>,
    },
}

impl TransportCredential {
    /// Build the credential for a plan, loading the pinned CA if there is one
    pub fn build(plan: TransportPlan) -> Result<Self> {
        tracing::debug!(plan = ?plan, "Building transport credential");

        let credential = match plan {
            TransportPlan::Plaintext => Self::Insecure,
            TransportPlan::PlatformRoots => Self::Tls {
                roots: TrustRoot::Platform,
                server_name: None,
            },
            TransportPlan::PlatformRootsAs { server_name } => Self::Tls {
                roots: TrustRoot::Platform,
                server_name: Some(server_name),
            },
            TransportPlan::PinnedCa { ca_cert } => Self::Tls {
                roots: load_pinned_root(&ca_cert)?,
                server_name: None,
            },
            TransportPlan::PinnedCaAs {
                ca_cert,
                server_name,
            } => Self::Tls {
                roots: load_pinned_root(&ca_cert)?,
                server_name: Some(server_name),
            },
        };

        Ok(credential)
    }

    /// URI scheme matching the credential
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Insecure => "http",
            Self::Tls { .. } => "https",
        }
    }

    /// tonic TLS settings, or `None` for plaintext
    pub fn client_tls_config(&self) -> Option<ClientTlsConfig> {
        let Self::Tls { roots, server_name } = self else {
            return None;
        };

        let mut tls = match roots {
            TrustRoot::Platform => ClientTlsConfig::new().with_native_roots(),
            TrustRoot::Pinned { pem, .. } => {
                ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem))
            }
        };

        if let Some(name) = server_name {
            tls = tls.domain_name(name.clone());
        }

        Some(tls)
    }
}

/// Read a PEM bundle and make sure it holds at least one certificate
fn load_pinned_root(path: &Path) -> Result<TrustRoot> {
    let load_error = |reason: String| Error::CertificateLoad {
        path: path.to_path_buf(),
        reason,
    };

    let pem = std::fs::read(path).map_err(|e| load_error(e.to_string()))?;

    let mut reader = BufReader::new(pem.as_slice());
    let certificates = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| load_error(format!("failed to parse PEM: {}", e)))?;

    if certificates.is_empty() {
        return Err(load_error("file contains no certificates".to_string()));
    }

    tracing::debug!(
        path = %path.display(),
        certificates = certificates.len(),
        "Loaded pinned CA bundle"
    );

    Ok(TrustRoot::Pinned {
        path: path.to_path_buf(),
        pem,
    })
}
