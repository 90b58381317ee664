//! Command-level flows against real files.

use clap::Parser;
use prov_cli::{keys, Cli, Config, ExitCode};
use tempfile::TempDir;

fn run(args: &[&str]) -> ExitCode {
    let mut argv = vec!["provrec", "--output", "quiet"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv)
        .unwrap()
        .execute_with_config(Config::default())
        .unwrap()
}

fn path_str(path: &std::path::Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_keygen_sign_verify() {
    let dir = TempDir::new().unwrap();
    let key = dir.path().join("peer.key");
    let payload = dir.path().join("payload.json");
    let envelope = dir.path().join("envelope.json");

    assert_eq!(run(&["keygen", "--out", path_str(&key)]), ExitCode::Success);
    std::fs::write(&payload, r#"{"Keys":["bafyTEST"],"Addrs":["/ip4/127.0.0.1/tcp/4001"]}"#)
        .unwrap();

    assert_eq!(
        run(&[
            "sign", "--key", path_str(&key), "--payload", path_str(&payload), "--stamp",
            "--out", path_str(&envelope),
        ]),
        ExitCode::Success
    );
    assert_eq!(run(&["verify", path_str(&envelope)]), ExitCode::Success);
    assert_eq!(run(&["inspect", path_str(&envelope)]), ExitCode::Success);

    let record = prov_record::decode_envelope(&std::fs::read(&envelope).unwrap())
        .unwrap()
        .into_verified()
        .unwrap();
    let identity = keys::load_identity(&key).unwrap();
    assert_eq!(record.peer_id(), &identity.peer_id());
}

#[test]
fn test_tampered_envelope_fails_verification() {
    let dir = TempDir::new().unwrap();
    let key = dir.path().join("peer.key");
    let payload = dir.path().join("payload.json");
    let envelope = dir.path().join("envelope.json");

    run(&["keygen", "--out", path_str(&key)]);
    std::fs::write(&payload, r#"{"Keys":["bafyTEST"]}"#).unwrap();
    run(&[
        "sign", "--key", path_str(&key), "--payload", path_str(&payload), "--out",
        path_str(&envelope),
    ]);

    let wire = std::fs::read_to_string(&envelope).unwrap();
    std::fs::write(&envelope, wire.replace("bafyTEST", "bafyEVIL")).unwrap();

    assert_eq!(run(&["verify", path_str(&envelope)]), ExitCode::VerificationFailed);
    assert_eq!(run(&["inspect", path_str(&envelope)]), ExitCode::Success);
}

#[test]
fn test_sign_refuses_payload_for_other_peer() {
    let dir = TempDir::new().unwrap();
    let key_a = dir.path().join("a.key");
    let key_b = dir.path().join("b.key");
    let payload = dir.path().join("payload.json");

    run(&["keygen", "--out", path_str(&key_a)]);
    let peer_b = keys::generate_key_file(&key_b, false).unwrap().peer_id();
    std::fs::write(&payload, format!(r#"{{"Keys":["bafyTEST"],"ID":"{peer_b}"}}"#)).unwrap();

    assert_eq!(
        run(&["sign", "--key", path_str(&key_a), "--payload", path_str(&payload)]),
        ExitCode::InvalidInput
    );
}

#[test]
fn test_verify_unsigned_and_malformed_input() {
    let dir = TempDir::new().unwrap();
    let unsigned = dir.path().join("unsigned.json");
    let garbage = dir.path().join("garbage.json");

    std::fs::write(&unsigned, r#"{"Protocol":"transport-bitswap","Payload":{}}"#).unwrap();
    std::fs::write(&garbage, "not json").unwrap();

    assert_eq!(run(&["verify", path_str(&unsigned)]), ExitCode::InvalidInput);
    assert_eq!(run(&["verify", path_str(&garbage)]), ExitCode::InvalidInput);
}

#[test]
fn test_missing_key_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    let payload = dir.path().join("payload.json");
    std::fs::write(&payload, "{}").unwrap();

    assert_eq!(
        run(&["sign", "--payload", path_str(&payload)]),
        ExitCode::InvalidInput
    );
    assert_eq!(run(&["peer-id"]), ExitCode::InvalidInput);
}

#[test]
fn test_config_init_writes_loadable_file() {
    let dir = TempDir::new().unwrap();
    let sample = dir.path().join("sample.toml");
    let pinned = dir.path().join("nested").join("pinned.toml");
    let key = dir.path().join("peer.key");

    assert_eq!(
        run(&["config", "init", "--path", path_str(&sample)]),
        ExitCode::Success
    );
    let loaded = Config::load(&sample).unwrap();
    assert!(loaded.identity.key_path.is_none());

    assert_eq!(
        run(&[
            "config", "init", "--path", path_str(&pinned), "--key", path_str(&key),
        ]),
        ExitCode::Success
    );
    let loaded = Config::load(&pinned).unwrap();
    assert_eq!(loaded.identity.key_path.as_deref(), Some(key.as_path()));
}

#[test]
fn test_config_init_refuses_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "# hand edited\n").unwrap();

    assert_eq!(
        run(&["config", "init", "--path", path_str(&path)]),
        ExitCode::InvalidInput
    );
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hand edited\n");

    assert_eq!(
        run(&["config", "init", "--path", path_str(&path), "--force"]),
        ExitCode::Success
    );
    assert!(Config::load(&path).is_ok());
}

#[test]
fn test_config_show_prints_effective_config() {
    assert_eq!(run(&["config", "show"]), ExitCode::Success);
}
