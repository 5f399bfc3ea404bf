use crate::ProbeContext;
use proxykit_containers::ContainerIdentity;
use proxykit_generator::{ConfigDocument, ProxyEntry};
use proxykit_http::ProxyRoute;

pub fn route_for_entry(entry: &ProxyEntry) -> ProxyRoute {
    ProxyRoute {
        host: entry.hostname.clone(),
        port: entry.port,
        username: entry.username.clone(),
        password: entry.password.clone(),
    }
}

/// Pair each container with a proxy persona.
///
/// Container `i` (in the given order) uses `data[i mod N]`. With no document,
/// or an empty one, every probe goes direct.
pub fn assign_routes(
    containers: &[ContainerIdentity],
    document: Option<&ConfigDocument>,
) -> Vec<ProbeContext> {
    let entries = document.map(|d| d.data.as_slice()).unwrap_or_default();
    containers
        .iter()
        .enumerate()
        .map(|(i, c)| ProbeContext {
            cookie_store_id: c.cookie_store_id.clone(),
            route: (!entries.is_empty()).then(|| route_for_entry(&entries[i % entries.len()])),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxykit_generator::{build_document, Credentials, GeneratorOptions};

    fn containers(n: usize) -> Vec<ContainerIdentity> {
        (1..=n)
            .map(|i| ContainerIdentity {
                cookie_store_id: format!("firefox-container-{i}"),
                name: format!("Proxy {i}"),
                color: "blue".into(),
                color_code: None,
                icon: "fingerprint".into(),
            })
            .collect()
    }

    #[test]
    fn without_document_probes_go_direct() {
        let contexts = assign_routes(&containers(2), None);
        assert!(contexts.iter().all(|c| c.route.is_none()));
    }

    #[test]
    fn personas_wrap_around() {
        let opts = GeneratorOptions::new("na.proxys5.net", 6200, "US", 2);
        let doc = build_document(&opts, &Credentials::new("alice", "pw")).unwrap();
        let contexts = assign_routes(&containers(3), Some(&doc));
        let users: Vec<_> = contexts
            .iter()
            .map(|c| c.route.as_ref().unwrap().username.clone())
            .collect();
        assert_eq!(users[0], doc.data[0].username);
        assert_eq!(users[1], doc.data[1].username);
        assert_eq!(users[2], doc.data[0].username);
        let route = contexts[0].route.as_ref().unwrap();
        assert_eq!(route.display_target(), "na.proxys5.net:6200");
        assert_eq!(route.password, "pw");
    }
}
