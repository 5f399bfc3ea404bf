//! Plain-text rendering for the terminal.
use crate::banner::{Banner, BannerKind};
use crate::controller::CredentialStatus;
use crate::refresh::ContainerRow;
use proxykit_containers::ContainerIdentity;
use proxykit_probe::IpReport;
use std::fmt::Write;

pub const CONTAINERS_UNAVAILABLE: &str = "Container support is not available on this host. \
Per-proxy containers need the Multi-Account Containers capability.";

pub fn banner(b: &Banner) -> String {
    let tag = match b.kind {
        BannerKind::Success => "ok",
        BannerKind::Error => "error",
        BannerKind::Info => "info",
    };
    format!("[{tag}] {}", b.text)
}

pub fn credential_status(status: &CredentialStatus) -> String {
    match status {
        CredentialStatus::Valid { account, saved_at } => match saved_at {
            Some(at) => format!("Credentials: valid (account {account}, saved {at})"),
            None => format!("Credentials: valid (account {account})"),
        },
        CredentialStatus::Missing => "Credentials: missing".to_string(),
    }
}

pub fn containers(list: &[ContainerIdentity]) -> String {
    if list.is_empty() {
        return "No containers.\n".to_string();
    }
    let mut out = String::new();
    for c in list {
        let _ = writeln!(out, "{:<24} {:<20} {}", c.cookie_store_id, c.name, c.color);
    }
    out
}

pub fn container_rows(tick: Option<u64>, rows: &[ContainerRow]) -> String {
    let mut out = String::new();
    if let Some(tick) = tick {
        let _ = writeln!(out, "-- refresh #{tick} --");
    }
    if rows.is_empty() {
        out.push_str("No containers.\n");
        return out;
    }
    for row in rows {
        let _ = writeln!(
            out,
            "{:<20} IP: {:<18} Location: {}",
            row.container.name, row.report.ip, row.report.location
        );
    }
    out
}

/// One container's report, for `ips --id`.
pub fn report(cookie_store_id: &str, report: &IpReport) -> String {
    format!(
        "{cookie_store_id:<24} IP: {:<18} Location: {}\n",
        report.ip, report.location
    )
}
