//! End-to-end command synthesis tests.
//!
//! These verify credential handling across protocols: which channel the
//! password travels through, how often the loader runs, and what ends up in
//! the `.pgpass` file.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::uninlined_format_args)]

use std::cell::Cell;
use std::path::{Path, PathBuf};

use dbhooks_core::client::PGPASSWORD;
use dbhooks_core::{Client, Config, DbHooksError, Password, PasswordLoader, PgPass, PgPassEntry};

const LOADED_PASSWORD: &str = "super_secret_password_123";

struct CountingLoader {
    calls: Cell<usize>,
}

impl CountingLoader {
    fn new() -> Self {
        Self {
            calls: Cell::new(0),
        }
    }
}

impl PasswordLoader for CountingLoader {
    fn get_password(&self, _connection_name: &str) -> dbhooks_core::Result<Password> {
        self.calls.set(self.calls.get() + 1);
        Ok(Password::new(LOADED_PASSWORD))
    }
}

fn config_with(pgpass: &Path, enable: bool, connections: &str) -> Config {
    let text = format!(
        "[pgpass]\nenable = {}\npath = \"{}\"\n\n{}",
        enable,
        pgpass.display(),
        connections
    );
    Config::parse(&text, Path::new("dbhooks.toml")).expect("valid test config")
}

const SALES: &str = r#"
[connections.sales]
protocol = "postgres"
host = "db1"
port = 5432
username = "alice"
database = "sales"
"#;

fn pgpass_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("home").join(".pgpass")
}

#[test]
fn test_postgres_pgpass_example() {
    let dir = tempfile::tempdir().unwrap();
    let path = pgpass_path(&dir);
    let config = config_with(&path, true, SALES);
    let loader = CountingLoader::new();

    let command = Client::new(&config, "sales", &loader)
        .unwrap()
        .synthesize()
        .unwrap();

    assert_eq!(
        command.argv,
        vec!["psql", "-U", "alice", "-h", "db1", "-p", "5432", "-d", "sales"]
    );
    assert!(command.env.is_empty());
    assert!(!command.exposes_secret());
    assert_eq!(loader.calls.get(), 1);

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, format!("db1:5432:sales:alice:{}\n", LOADED_PASSWORD));
}

#[test]
fn test_postgres_pgpass_replaces_stale_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = pgpass_path(&dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        "# keep me\n\
         db1:5432:sales:alice:stale\n\
         other:5432:hr:carol:carolpw\n\
         db1:*:sales:alice:also-stale\n",
    )
    .unwrap();

    let config = config_with(&path, true, SALES);
    let loader = CountingLoader::new();

    // Twice: side effects are idempotent
    for _ in 0..2 {
        Client::new(&config, "sales", &loader)
            .unwrap()
            .synthesize()
            .unwrap();
    }

    let pgpass = PgPass::load(&path).unwrap();
    let key = PgPassEntry::new("db1", "5432", "sales", "alice");
    let matching: Vec<_> = pgpass.entries().filter(|e| e.matches(&key)).collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(
        matching[0].password.as_ref().unwrap().expose(),
        LOADED_PASSWORD
    );

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        format!(
            "# keep me\nother:5432:hr:carol:carolpw\ndb1:5432:sales:alice:{}\n",
            LOADED_PASSWORD
        )
    );
}

#[test]
fn test_postgres_pgpass_unset_port_replaces_literal_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = pgpass_path(&dir);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "db1:5432:sales:alice:stale\n").unwrap();

    let config = config_with(
        &path,
        true,
        r#"
        [connections.sales]
        protocol = "postgres"
        host = "db1"
        username = "alice"
        database = "sales"
        "#,
    );
    let loader = CountingLoader::new();

    Client::new(&config, "sales", &loader)
        .unwrap()
        .synthesize()
        .unwrap();

    let pgpass = PgPass::load(&path).unwrap();
    let used = pgpass
        .find(&PgPassEntry::new("db1", "5432", "sales", "alice"))
        .unwrap();
    assert_eq!(used.password.as_ref().unwrap().expose(), LOADED_PASSWORD);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        format!("db1:*:sales:alice:{}\n", LOADED_PASSWORD)
    );
}

#[test]
fn test_postgres_pgpass_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let path = pgpass_path(&dir);
    let config = config_with(&path, false, SALES);
    let loader = CountingLoader::new();

    let command = Client::new(&config, "sales", &loader)
        .unwrap()
        .synthesize()
        .unwrap();

    assert_eq!(
        command.env.get(PGPASSWORD).map(String::as_str),
        Some(LOADED_PASSWORD)
    );
    assert!(command.argv.iter().all(|a| !a.contains(LOADED_PASSWORD)));
    assert!(!path.exists());
    assert_eq!(loader.calls.get(), 1);
}

#[test]
fn test_explicit_password_never_calls_loader() {
    let dir = tempfile::tempdir().unwrap();
    let path = pgpass_path(&dir);
    let config = config_with(
        &path,
        true,
        r#"
        [connections.sales]
        protocol = "postgresql"
        host = "db1"
        port = 5432
        username = "alice"
        database = "sales"
        password = "explicit-pw"

        [connections.shop]
        protocol = "mysql"
        host = "db2"
        port = 3306
        username = "bob"
        database = "shop"
        password = "explicit-pw"
        "#,
    );
    let loader = CountingLoader::new();

    for name in ["sales", "shop"] {
        Client::new(&config, name, &loader)
            .unwrap()
            .synthesize()
            .unwrap();
    }

    assert_eq!(loader.calls.get(), 0);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "db1:5432:sales:alice:explicit-pw\n"
    );
}

#[test]
fn test_no_password_requirement_has_no_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let path = pgpass_path(&dir);
    let config = config_with(
        &path,
        true,
        r#"
        [connections.sales]
        protocol = "pg"
        host = "db1"
        port = 5432
        username = "alice"
        database = "sales"
        has_password = false

        [connections.shop]
        protocol = "mysql"
        host = "db2"
        port = 3306
        username = "bob"
        database = "shop"
        has_password = false

        [connections.local]
        protocol = "sqlite"
        database = "local.db"
        "#,
    );
    let loader = CountingLoader::new();

    for name in ["sales", "shop", "local"] {
        let command = Client::new(&config, name, &loader)
            .unwrap()
            .synthesize()
            .unwrap();

        assert!(
            command.argv.iter().all(|a| !a.contains(LOADED_PASSWORD)),
            "credential in argv for {}",
            name
        );
        assert!(!command.env.contains_key(PGPASSWORD), "{}", name);
    }

    assert_eq!(loader.calls.get(), 0);
    assert!(!path.exists());
}

#[test]
fn test_mysql_quote_in_password_stays_one_argument() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with(
        &pgpass_path(&dir),
        true,
        r#"
        [connections.shop]
        protocol = "mysql"
        host = "db2"
        port = 3306
        username = "bob"
        database = "shop"
        password = "it's \"complicated\" $x"
        "#,
    );
    let loader = CountingLoader::new();

    let command = Client::new(&config, "shop", &loader)
        .unwrap()
        .synthesize()
        .unwrap();

    assert_eq!(command.argv.len(), 10);
    assert_eq!(command.argv[8], r#"it's "complicated" $x"#);
    assert_eq!(command.argv[9], "shop");
}

#[test]
fn test_unsupported_protocol_fails_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let path = pgpass_path(&dir);
    let config = config_with(
        &path,
        true,
        r#"
        [connections.legacy]
        protocol = "db2"
        "#,
    );
    let loader = CountingLoader::new();

    let err = Client::new(&config, "legacy", &loader).err().unwrap();
    assert!(matches!(err, DbHooksError::UnsupportedProtocol { .. }));
    assert_eq!(loader.calls.get(), 0);
    assert!(!path.exists());
}

#[test]
fn test_pgpass_location_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("from-env.pgpass");
    let config = Config::parse(SALES, Path::new("dbhooks.toml")).unwrap();
    let loader = CountingLoader::new();

    temp_env::with_var("PGPASSFILE", Some(&path), || {
        Client::new(&config, "sales", &loader)
            .unwrap()
            .synthesize()
            .unwrap();
    });

    assert!(
        std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("db1:5432:sales:alice:")
    );
}
