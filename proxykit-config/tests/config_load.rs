use proxykit_config::ProxyKitConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn file_values_and_env_expansion() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "proxykit.yaml",
        r#"
generator:
  endpoint: "${PK_TEST_ENDPOINT}"
  port: 7000
  proxy_count: 4
ui:
  banner_secs: 5
"#,
    );

    temp_env::with_var("PK_TEST_ENDPOINT", Some("as.proxys5.net"), || {
        let config = ProxyKitConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config");

        assert_eq!(config.generator.endpoint, "as.proxys5.net");
        assert_eq!(config.generator.port, 7000);
        assert_eq!(config.generator.proxy_count, 4);
        assert_eq!(config.generator.region, "US");
        assert_eq!(config.ui.banner_secs, 5);
        assert_eq!(config.ui.refresh_interval_secs, 30);
    });
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "proxykit.yaml", "generator:\n  region: US\n");

    temp_env::with_vars(
        [
            ("PROXYKIT__GENERATOR__REGION", Some("GB")),
            ("PROXYKIT__GENERATOR__PROXY_COUNT", Some("2")),
        ],
        || {
            let config = ProxyKitConfigLoader::new().with_file(&p).load().unwrap();
            assert_eq!(config.generator.region, "GB");
            assert_eq!(config.generator.proxy_count, 2);
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_is_fine() {
    let tmp = TempDir::new().unwrap();
    let config = ProxyKitConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .unwrap();
    assert_eq!(config.generator.proxy_count, 10);
}

#[test]
#[serial]
fn missing_required_file_fails() {
    let tmp = TempDir::new().unwrap();
    let result = ProxyKitConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn invalid_values_are_rejected() {
    let result = ProxyKitConfigLoader::new()
        .with_yaml_str("generator:\n  proxy_count: 0\n")
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn lowercase_region_is_normalised() {
    let config = ProxyKitConfigLoader::new()
        .with_yaml_str("generator:\n  region: \" de \"\n")
        .load()
        .unwrap();
    assert_eq!(config.generator.region, "DE");
}

#[test]
#[serial]
fn non_letter_region_is_rejected() {
    let result = ProxyKitConfigLoader::new()
        .with_yaml_str("generator:\n  region: \"U-S\"\n")
        .load();
    assert!(result.is_err());
}
