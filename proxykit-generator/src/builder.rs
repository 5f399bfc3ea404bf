use crate::document::{ConfigDocument, ProxyEntry, PROXY_TYPE_SOCKS5};
use crate::options::{Credentials, GeneratorOptions, SESSION_MINUTES};
use crate::palette;
use crate::GeneratorError;
use rand::distributions::Alphanumeric;
use rand::Rng;

pub const SESSION_ID_LEN: usize = 8;

/// Eight characters drawn uniformly from `[A-Za-z0-9]`.
pub fn generate_session_id() -> String {
    generate_session_id_with(&mut rand::thread_rng())
}

pub fn generate_session_id_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Build the entry at position `index` (0-based) with a fresh session id.
pub fn build_entry(
    index: usize,
    options: &GeneratorOptions,
    credentials: &Credentials,
) -> Result<ProxyEntry, GeneratorError> {
    credentials.validate()?;
    Ok(entry_with_rng(index, options, credentials, &mut rand::thread_rng()))
}

/// Build all `proxy_count` entries in index order. All-or-nothing: invalid
/// credentials or options fail before any entry exists.
pub fn build_document(
    options: &GeneratorOptions,
    credentials: &Credentials,
) -> Result<ConfigDocument, GeneratorError> {
    build_document_with_rng(options, credentials, &mut rand::thread_rng())
}

pub fn build_document_with_rng<R: Rng + ?Sized>(
    options: &GeneratorOptions,
    credentials: &Credentials,
    rng: &mut R,
) -> Result<ConfigDocument, GeneratorError> {
    credentials.validate()?;
    options.validate()?;

    let data: Vec<ProxyEntry> = (0..options.proxy_count as usize)
        .map(|i| entry_with_rng(i, options, credentials, rng))
        .collect();

    tracing::debug!(
        mode = %options.mode(),
        region = %options.region,
        entries = data.len(),
        account = %proxykit_common::fingerprint(&credentials.username),
        "generator.document.built"
    );
    Ok(ConfigDocument::new(options.mode(), data))
}

// The username template is the provider's session-routing contract.
fn entry_with_rng<R: Rng + ?Sized>(
    index: usize,
    options: &GeneratorOptions,
    credentials: &Credentials,
    rng: &mut R,
) -> ProxyEntry {
    let session_id = generate_session_id_with(rng);
    let username = format!(
        "{}-region-{}-sessid-{}-sessTime-{}",
        credentials.username, options.region, session_id, SESSION_MINUTES
    );

    ProxyEntry {
        active: true,
        title: format!("{} {}", index + 1, palette::icon_for(index)),
        kind: PROXY_TYPE_SOCKS5.to_string(),
        hostname: options.endpoint.clone(),
        port: options.port,
        username,
        password: credentials.password.clone(),
        cc: String::new(),
        city: String::new(),
        color: palette::color_for(index).to_string(),
        pac: String::new(),
        pac_string: String::new(),
        proxy_dns: true,
        include: Vec::new(),
        exclude: Vec::new(),
        tab_proxy: Vec::new(),
    }
}
