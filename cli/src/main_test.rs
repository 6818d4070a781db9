use super::*;
use clap::CommandFactory;

// =============================================================================
// arguments
// =============================================================================

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn edit_url_joins_scene_and_user() {
    assert_eq!(edit_url("ws://h:1/", "s1", "ann"), "ws://h:1/api/edit/s1?user=ann");
}

#[test]
fn edit_url_encodes_reserved_characters() {
    assert_eq!(
        edit_url("ws://h:1", "my scene/2", "ann&role=admin"),
        "ws://h:1/api/edit/my%20scene%2F2?user=ann%26role%3Dadmin"
    );
}

#[test]
fn send_create_parses_shape() {
    let cli = Cli::try_parse_from(["mesh-cli", "--user", "u", "--scene", "s", "send", "create", "pyramid"])
        .expect("parse");
    let Command::Send(SendCommand { command: SendSubcommand::Create { shape }, timeout_ms }) = cli.command else {
        panic!("expected send create");
    };
    assert_eq!(Primitive::from(shape), Primitive::Pyramid);
    assert_eq!(timeout_ms, 5000);
}

#[test]
fn unknown_shape_is_rejected() {
    assert!(Cli::try_parse_from(["mesh-cli", "--user", "u", "--scene", "s", "send", "create", "torus"]).is_err());
}

// =============================================================================
// echo matching
// =============================================================================

#[test]
fn echo_matches_kind_and_user() {
    let own = Message::Chat { user: "ann".into(), text: "hi".into() };
    let other = Message::Chat { user: "bob".into(), text: "hi".into() };
    let rename = Message::Name { value: "x".into() };
    assert!(is_echo(&own, "message", "ann"));
    assert!(!is_echo(&other, "message", "ann"));
    assert!(is_echo(&rename, "name", "ann"));
    assert!(!is_echo(&rename, "message", "ann"));
}
