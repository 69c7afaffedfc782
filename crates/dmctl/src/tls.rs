//! TLS configuration for the master connection
//!
//! Loads CA, client certificate and key from disk and validates the material
//! before the first dial, so a broken path or file fails at startup instead
//! of during the handshake.
//!
//! With `cert-allowed-cn` set, the master's certificate chain is still
//! verified against the CA, but instead of matching the dialed host the
//! subject common name of the leaf must be one of the allowed names.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{
    CertificateDer, PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer, PrivateSec1KeyDer,
    ServerName, UnixTime,
};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use thiserror::Error;
use x509_parser::prelude::*;
use zeroize::Zeroizing;

use crate::config::SecurityConfig;

/// ALPN protocol gRPC runs over
const ALPN_H2: &[u8] = b"h2";

/// TLS configuration errors
#[derive(Debug, Error)]
pub enum TlsError {
    /// File could not be read
    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Certificate parsing error
    #[error("certificate parsing error: {0}")]
    CertificateParse(String),

    /// Key parsing error
    #[error("key parsing error: {0}")]
    KeyParse(String),

    /// Only one half of the client key pair was configured
    #[error("missing {0}: ssl-cert and ssl-key must be set together")]
    MissingKeyPair(String),

    /// Client identity configured without a CA to verify the master
    #[error("missing ssl-ca")]
    MissingCa,

    /// TLS configuration rejected by rustls
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),
}

/// Validated TLS material for dialing the master.
pub struct TlsMaterial {
    /// CA certificates the master's chain must lead to
    ca_certs: Vec<CertificateDer<'static>>,
    /// Client certificate chain and private key PEM (zeroized on drop)
    identity: Option<(Vec<CertificateDer<'static>>, Zeroizing<String>)>,
    /// Common names the master's certificate may carry; empty means the
    /// certificate must match the dialed host instead
    allowed_cn: Vec<String>,
}

impl TlsMaterial {
    /// Load TLS material described by `security`.
    ///
    /// Returns `Ok(None)` when no CA, certificate or key is configured, which
    /// means the connection is made in plaintext.
    pub fn load(security: &SecurityConfig) -> Result<Option<Self>, TlsError> {
        let has_cert = !security.ssl_cert.is_empty();
        let has_key = !security.ssl_key.is_empty();

        if security.ssl_ca.is_empty() {
            if has_cert || has_key {
                return Err(TlsError::MissingCa);
            }
            return Ok(None);
        }

        let ca_certs = parse_certificates(&security.ssl_ca, &read_file(&security.ssl_ca)?)?;

        let identity = match (has_cert, has_key) {
            (true, true) => {
                let chain =
                    parse_certificates(&security.ssl_cert, &read_file(&security.ssl_cert)?)?;
                let key_pem = Zeroizing::new(read_file(&security.ssl_key)?);
                parse_private_key(&security.ssl_key, &key_pem)?;
                Some((chain, key_pem))
            }
            (true, false) => return Err(TlsError::MissingKeyPair("ssl-key".to_string())),
            (false, true) => return Err(TlsError::MissingKeyPair("ssl-cert".to_string())),
            (false, false) => None,
        };

        Ok(Some(Self {
            ca_certs,
            identity,
            allowed_cn: security.cert_allowed_cn.clone(),
        }))
    }

    /// Whether a client certificate will be presented
    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    /// Common names accepted on the master's certificate
    pub fn allowed_cn(&self) -> &[String] {
        &self.allowed_cn
    }

    /// Build the rustls client config used for every handshake.
    pub fn client_config(&self) -> Result<ClientConfig, TlsError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = self.server_verifier(provider.clone())?;

        let builder = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| TlsError::TlsConfig(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(verifier);

        let mut config = match &self.identity {
            Some((chain, key_pem)) => builder
                .with_client_auth_cert(chain.clone(), parse_private_key("ssl-key", key_pem)?)
                .map_err(|e| TlsError::TlsConfig(e.to_string()))?,
            None => builder.with_no_client_auth(),
        };
        config.alpn_protocols = vec![ALPN_H2.to_vec()];
        Ok(config)
    }

    fn server_verifier(
        &self,
        provider: Arc<CryptoProvider>,
    ) -> Result<Arc<dyn ServerCertVerifier>, TlsError> {
        let mut roots = RootCertStore::empty();
        for cert in &self.ca_certs {
            roots
                .add(cert.clone())
                .map_err(|e| TlsError::TlsConfig(e.to_string()))?;
        }

        let webpki = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(|e| TlsError::TlsConfig(e.to_string()))?;

        if self.allowed_cn.is_empty() {
            return Ok(webpki);
        }
        Ok(Arc::new(AllowedCnVerifier {
            inner: webpki,
            allowed_cn: self.allowed_cn.clone(),
        }))
    }
}

/// Verifies the chain with webpki, then the leaf's common name against a list.
#[derive(Debug)]
struct AllowedCnVerifier {
    inner: Arc<WebPkiServerVerifier>,
    allowed_cn: Vec<String>,
}

impl ServerCertVerifier for AllowedCnVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let (_, cert) = X509Certificate::from_der(end_entity.as_ref())
            .map_err(|e| rustls::Error::General(format!("invalid peer certificate: {}", e)))?;

        // Host matching is replaced by the CN check below, so the chain is
        // verified against a name the certificate itself carries.
        let name = first_subject_alt_name(&cert).unwrap_or_else(|| server_name.to_owned());
        self.inner
            .verify_server_cert(end_entity, intermediates, &name, ocsp_response, now)?;

        match common_name(&cert) {
            Some(cn) if self.allowed_cn.iter().any(|allowed| *allowed == cn) => {
                Ok(ServerCertVerified::assertion())
            }
            cn => Err(rustls::Error::General(format!(
                "peer common name {} is not in cert-allowed-cn {:?}",
                cn.as_deref().unwrap_or("<none>"),
                self.allowed_cn
            ))),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

fn common_name(cert: &X509Certificate<'_>) -> Option<String> {
    cert.subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

fn first_subject_alt_name(cert: &X509Certificate<'_>) -> Option<ServerName<'static>> {
    let san = cert.subject_alternative_name().ok().flatten()?;
    san.value.general_names.iter().find_map(|name| match name {
        GeneralName::DNSName(dns) => ServerName::try_from(dns.to_string()).ok(),
        GeneralName::IPAddress(bytes) => ip_from_bytes(bytes).map(ServerName::from),
        _ => None,
    })
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(|b| IpAddr::V4(Ipv4Addr::from(b))),
        16 => <[u8; 16]>::try_from(bytes).ok().map(|b| IpAddr::V6(Ipv6Addr::from(b))),
        _ => None,
    }
}

fn read_file(path: &str) -> Result<String, TlsError> {
    std::fs::read_to_string(path).map_err(|source| TlsError::ReadFile {
        path: path.to_string(),
        source,
    })
}

/// Every PEM file must hold at least one parseable X.509 certificate
fn parse_certificates(path: &str, contents: &str) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let blocks = ::pem::parse_many(contents)
        .map_err(|e| TlsError::CertificateParse(format!("{}: {}", path, e)))?;

    let mut certs = Vec::new();
    for block in blocks.into_iter().filter(|b| b.tag() == "CERTIFICATE") {
        X509Certificate::from_der(block.contents())
            .map_err(|e| TlsError::CertificateParse(format!("{}: {}", path, e)))?;
        certs.push(CertificateDer::from(block.into_contents()));
    }

    if certs.is_empty() {
        return Err(TlsError::CertificateParse(format!(
            "no certificate found in {}",
            path
        )));
    }
    Ok(certs)
}

fn parse_private_key(path: &str, contents: &str) -> Result<PrivateKeyDer<'static>, TlsError> {
    let blocks =
        ::pem::parse_many(contents).map_err(|e| TlsError::KeyParse(format!("{}: {}", path, e)))?;

    for block in blocks {
        let key: PrivateKeyDer<'static> = match block.tag() {
            "PRIVATE KEY" => PrivatePkcs8KeyDer::from(block.into_contents()).into(),
            "RSA PRIVATE KEY" => PrivatePkcs1KeyDer::from(block.into_contents()).into(),
            "EC PRIVATE KEY" => PrivateSec1KeyDer::from(block.into_contents()).into(),
            _ => continue,
        };
        return Ok(key);
    }
    Err(TlsError::KeyParse(format!("no private key found in {}", path)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    use rcgen::{
        BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType,
        ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose,
    };
    use rustls::pki_types::CertificateDer;

    use crate::config::SecurityConfig;

    /// A CA, a master certificate and a dmctl client certificate on disk.
    pub(crate) struct TestPki {
        pub(crate) security: SecurityConfig,
        pub(crate) ca_pem: String,
        pub(crate) server_cert_pem: String,
        pub(crate) server_key_pem: String,
        pub(crate) server_cert_der: CertificateDer<'static>,
    }

    fn leaf_params(cn: &str, sans: &[&str], usage: ExtendedKeyUsagePurpose) -> CertificateParams {
        let sans: Vec<String> = sans.iter().map(|s| s.to_string()).collect();
        let mut params = CertificateParams::new(sans).expect("leaf params should be valid");
        params.distinguished_name = DistinguishedName::new();
        params.distinguished_name.push(DnType::CommonName, cn);
        params.extended_key_usages = vec![usage];
        params
    }

    fn signed(params: CertificateParams, ca: &Certificate, ca_key: &KeyPair) -> (Certificate, KeyPair) {
        let key = KeyPair::generate().expect("key pair generation should succeed");
        let cert = params
            .signed_by(&key, ca, ca_key)
            .expect("signing should succeed");
        (cert, key)
    }

    /// Writes a CA plus a CA-signed client cert/key into `dir` and issues a
    /// master certificate with common name `server_cn` and SANs `server_sans`.
    ///
    /// The returned config allows `server_cn`.
    pub(crate) fn write_test_pki(dir: &Path, server_cn: &str, server_sans: &[&str]) -> TestPki {
        let ca_key = KeyPair::generate().expect("key pair generation should succeed");
        let mut ca_params =
            CertificateParams::new(Vec::<String>::new()).expect("CA params should be valid");
        ca_params.distinguished_name = DistinguishedName::new();
        ca_params.distinguished_name.push(DnType::CommonName, "dm test ca");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
        let ca_cert = ca_params
            .self_signed(&ca_key)
            .expect("CA creation should succeed");

        let (server_cert, server_key) = signed(
            leaf_params(server_cn, server_sans, ExtendedKeyUsagePurpose::ServerAuth),
            &ca_cert,
            &ca_key,
        );
        let (client_cert, client_key) = signed(
            leaf_params("dmctl", &["dmctl"], ExtendedKeyUsagePurpose::ClientAuth),
            &ca_cert,
            &ca_key,
        );

        let ca_path = dir.join("ca.pem");
        let cert_path = dir.join("client.pem");
        let key_path = dir.join("client.key");
        std::fs::write(&ca_path, ca_cert.pem()).expect("write should succeed");
        std::fs::write(&cert_path, client_cert.pem()).expect("write should succeed");
        std::fs::write(&key_path, client_key.serialize_pem()).expect("write should succeed");

        TestPki {
            security: SecurityConfig {
                ssl_ca: ca_path.to_string_lossy().into_owned(),
                ssl_cert: cert_path.to_string_lossy().into_owned(),
                ssl_key: key_path.to_string_lossy().into_owned(),
                cert_allowed_cn: vec![server_cn.to_string()],
            },
            ca_pem: ca_cert.pem(),
            server_cert_pem: server_cert.pem(),
            server_key_pem: server_key.serialize_pem(),
            server_cert_der: server_cert.der().clone(),
        }
    }

    /// Client side of [`write_test_pki`] for a master named `dm-master`.
    pub(crate) fn write_test_material(dir: &Path) -> SecurityConfig {
        write_test_pki(dir, "dm-master", &["dm-master"]).security
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{write_test_material, write_test_pki};
    use super::*;

    fn verify(material: &TlsMaterial, leaf: &CertificateDer<'static>) -> Result<(), rustls::Error> {
        let verifier = material
            .server_verifier(Arc::new(rustls::crypto::ring::default_provider()))
            .expect("verifier should build");
        let host = ServerName::try_from("127.0.0.1").expect("IP should be a valid server name");
        verifier
            .verify_server_cert(leaf, &[], &host, &[], UnixTime::now())
            .map(|_| ())
    }

    #[test]
    fn test_empty_security_is_plaintext() {
        let material = TlsMaterial::load(&SecurityConfig::default()).expect("load should succeed");
        assert!(material.is_none());
    }

    #[test]
    fn test_loads_valid_material() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let security = write_test_material(dir.path());

        let material = TlsMaterial::load(&security)
            .expect("load should succeed")
            .expect("TLS should be enabled");
        assert!(material.has_identity());
        assert_eq!(material.allowed_cn(), ["dm-master".to_string()]);

        let config = material.client_config().expect("client config should build");
        assert_eq!(config.alpn_protocols, vec![b"h2".to_vec()]);
    }

    #[test]
    fn test_keeps_every_allowed_cn() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let mut security = write_test_material(dir.path());
        security.cert_allowed_cn = vec!["dm-master-1".to_string(), "dm-master-2".to_string()];

        let material = TlsMaterial::load(&security)
            .expect("load should succeed")
            .expect("TLS should be enabled");
        assert_eq!(material.allowed_cn().len(), 2);
    }

    #[test]
    fn test_second_allowed_cn_accepted() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let mut pki = write_test_pki(dir.path(), "dm-master-2", &["dm-master-2"]);
        pki.security.cert_allowed_cn = vec!["dm-master-1".to_string(), "dm-master-2".to_string()];

        let material = TlsMaterial::load(&pki.security)
            .expect("load should succeed")
            .expect("TLS should be enabled");
        verify(&material, &pki.server_cert_der).expect("listed CN should be accepted");
    }

    #[test]
    fn test_allowed_cn_with_ip_only_san_accepted() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let pki = write_test_pki(dir.path(), "dm-master", &["10.0.0.7"]);

        let material = TlsMaterial::load(&pki.security)
            .expect("load should succeed")
            .expect("TLS should be enabled");
        verify(&material, &pki.server_cert_der).expect("listed CN should be accepted");
    }

    #[test]
    fn test_unlisted_cn_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let mut pki = write_test_pki(dir.path(), "dm-master-3", &["dm-master-3"]);
        pki.security.cert_allowed_cn = vec!["dm-master-1".to_string(), "dm-master-2".to_string()];

        let material = TlsMaterial::load(&pki.security)
            .expect("load should succeed")
            .expect("TLS should be enabled");
        let err = verify(&material, &pki.server_cert_der).expect_err("unlisted CN should fail");
        assert!(err.to_string().contains("dm-master-3"));
    }

    #[test]
    fn test_untrusted_chain_rejected_despite_allowed_cn() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let trusted = write_test_pki(dir.path(), "dm-master", &["dm-master"]);
        let other_dir = tempfile::tempdir().expect("tempdir should succeed");
        let rogue = write_test_pki(other_dir.path(), "dm-master", &["dm-master"]);

        let material = TlsMaterial::load(&trusted.security)
            .expect("load should succeed")
            .expect("TLS should be enabled");
        assert!(verify(&material, &rogue.server_cert_der).is_err());
    }

    #[test]
    fn test_without_allowed_cn_host_must_match() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let mut pki = write_test_pki(dir.path(), "dm-master", &["dm-master"]);
        pki.security.cert_allowed_cn.clear();

        let material = TlsMaterial::load(&pki.security)
            .expect("load should succeed")
            .expect("TLS should be enabled");
        // dialed as 127.0.0.1, certificate only names dm-master
        assert!(verify(&material, &pki.server_cert_der).is_err());
    }

    #[test]
    fn test_ca_only_has_no_identity() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let mut security = write_test_material(dir.path());
        security.ssl_cert.clear();
        security.ssl_key.clear();

        let material = TlsMaterial::load(&security)
            .expect("load should succeed")
            .expect("TLS should be enabled");
        assert!(!material.has_identity());
    }

    #[test]
    fn test_missing_file_rejected() {
        let security = SecurityConfig {
            ssl_ca: "/nonexistent/ca.pem".to_string(),
            ..Default::default()
        };
        let err = TlsMaterial::load(&security).err().expect("load should fail");
        assert!(matches!(err, TlsError::ReadFile { .. }));
        assert!(err.to_string().contains("/nonexistent/ca.pem"));
    }

    #[test]
    fn test_garbage_certificate_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let mut security = write_test_material(dir.path());
        std::fs::write(&security.ssl_ca, "not a certificate").expect("write should succeed");
        security.cert_allowed_cn.clear();

        let err = TlsMaterial::load(&security).err().expect("load should fail");
        assert!(matches!(err, TlsError::CertificateParse(_)));
    }

    #[test]
    fn test_key_file_without_private_key_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let security = write_test_material(dir.path());
        // a certificate is not a key
        std::fs::copy(&security.ssl_cert, &security.ssl_key).expect("copy should succeed");

        let err = TlsMaterial::load(&security).err().expect("load should fail");
        assert!(matches!(err, TlsError::KeyParse(_)));
    }

    #[test]
    fn test_cert_without_key_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let mut security = write_test_material(dir.path());
        security.ssl_key.clear();

        let err = TlsMaterial::load(&security).err().expect("load should fail");
        assert!(matches!(err, TlsError::MissingKeyPair(ref which) if which == "ssl-key"));
    }

    #[test]
    fn test_identity_without_ca_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should succeed");
        let mut security = write_test_material(dir.path());
        security.ssl_ca.clear();

        let err = TlsMaterial::load(&security).err().expect("load should fail");
        assert!(matches!(err, TlsError::MissingCa));
    }
}
