//! Unit tests for server command resolution.

use std::fs;
use std::path::{Path, PathBuf};

use yr_weather_probe::config::ServerConfig;
use yr_weather_probe::transport::spawner::{
    release_binary_path, resolve_server_command, CommandSource,
};

fn server_in(dir: &Path) -> ServerConfig {
    ServerConfig {
        dir: dir.to_path_buf(),
        ..ServerConfig::default()
    }
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, b"").expect("write");
}

fn exe(name: &str) -> String {
    format!("{name}{}", std::env::consts::EXE_SUFFIX)
}

#[test]
fn release_path_is_under_target_release() {
    let server = server_in(Path::new("/srv/yr-weather-mcp"));
    assert_eq!(
        release_binary_path(&server),
        PathBuf::from("/srv/yr-weather-mcp/target/release").join(exe("yr-weather-mcp"))
    );
}

#[test]
fn release_path_follows_binary_name() {
    let server = ServerConfig {
        binary_name: "weather-server".into(),
        ..server_in(Path::new("srv"))
    };
    assert!(release_binary_path(&server).ends_with(exe("weather-server")));
}

#[test]
fn explicit_command_wins() {
    let dir = tempfile::tempdir().expect("tempdir");
    touch(&release_binary_path(&server_in(dir.path())));

    let server = ServerConfig {
        command: Some("python3".into()),
        args: vec!["server.py".into()],
        ..server_in(dir.path())
    };
    let cmd = resolve_server_command(&server, None);

    assert_eq!(cmd.source, CommandSource::Explicit);
    assert_eq!(cmd.program, PathBuf::from("python3"));
    assert_eq!(cmd.args, vec!["server.py".to_owned()]);
}

#[test]
fn release_binary_preferred_over_cargo() {
    let dir = tempfile::tempdir().expect("tempdir");
    let home = tempfile::tempdir().expect("home");
    let server = server_in(dir.path());
    touch(&release_binary_path(&server));
    touch(&home.path().join(".cargo").join("bin").join(exe("cargo")));

    let cmd = resolve_server_command(&server, Some(home.path()));

    assert_eq!(cmd.source, CommandSource::ReleaseBinary);
    assert_eq!(cmd.program, release_binary_path(&server));
    assert!(cmd.args.is_empty());
}

#[test]
fn cargo_in_home_used_without_release_binary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let home = tempfile::tempdir().expect("home");
    let cargo = home.path().join(".cargo").join("bin").join(exe("cargo"));
    touch(&cargo);

    let cmd = resolve_server_command(&server_in(dir.path()), Some(home.path()));

    assert_eq!(cmd.source, CommandSource::CargoHome);
    assert_eq!(cmd.program, cargo);
    assert_eq!(cmd.args, vec!["run".to_owned()]);
}

#[test]
fn falls_back_to_cargo_on_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let empty_home = tempfile::tempdir().expect("home");

    let cmd = resolve_server_command(&server_in(dir.path()), Some(empty_home.path()));

    assert_eq!(cmd.source, CommandSource::CargoOnPath);
    assert_eq!(cmd.program, PathBuf::from("cargo"));
    assert_eq!(cmd.to_string(), "cargo run");
}

#[test]
fn missing_home_falls_back_to_cargo_on_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cmd = resolve_server_command(&server_in(dir.path()), None);
    assert_eq!(cmd.source, CommandSource::CargoOnPath);
}

#[test]
fn release_directory_does_not_count_as_binary() {
    let dir = tempfile::tempdir().expect("tempdir");
    let server = server_in(dir.path());
    fs::create_dir_all(release_binary_path(&server)).expect("mkdir");

    let cmd = resolve_server_command(&server, None);
    assert_eq!(cmd.source, CommandSource::CargoOnPath);
}
