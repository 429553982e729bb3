//! Command synthesis.
//!
//! A [`Client`] turns one named connection profile into a [`ResolvedCommand`]:
//!
//! 1. pick the protocol's [`ClientDescriptor`] (unknown protocols fail here,
//!    before any I/O)
//! 2. pick the template: the profile's `command` override or the default
//! 3. substitute profile fields and the resolved password into the template
//!    and split it into argv
//! 4. build extra environment variables from the descriptor's mapping
//! 5. run the protocol's side effects, which may rewrite argv and env
//!
//! The password is resolved through one [`PasswordMemoizer`] per synthesis,
//! so the loader runs at most once.

mod command;
mod descriptor;

pub use command::ResolvedCommand;
pub use descriptor::{ClientDescriptor, MYSQL, PGPASSWORD, POSTGRESQL, SQLITE};

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::config::{Config, ConnectionProfile, ProfileField};
use crate::error::Result;
use crate::models::Protocol;
use crate::password::{PasswordLoader, PasswordMemoizer};
use crate::pgpass::{PgPass, PgPassEntry};
use crate::security::Password;

/// Command synthesizer for one named connection.
pub struct Client<'a> {
    config: &'a Config,
    connection_name: &'a str,
    profile: &'a ConnectionProfile,
    protocol: Protocol,
    loader: &'a dyn PasswordLoader,
}

impl<'a> Client<'a> {
    /// Looks up the connection and its protocol.
    ///
    /// # Errors
    /// Returns `UnknownConnection` if the name is not configured and
    /// `UnsupportedProtocol` if its protocol has no descriptor
    pub fn new(
        config: &'a Config,
        connection_name: &'a str,
        loader: &'a dyn PasswordLoader,
    ) -> Result<Self> {
        let profile = config.connection(connection_name)?;
        let protocol = profile.protocol.parse::<Protocol>()?;

        Ok(Self {
            config,
            connection_name,
            profile,
            protocol,
            loader,
        })
    }

    /// Protocol of the connection.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The connection profile being synthesized.
    pub fn profile(&self) -> &ConnectionProfile {
        self.profile
    }

    /// Effective command template.
    pub fn template(&self) -> &str {
        self.profile
            .command
            .as_deref()
            .unwrap_or(self.descriptor().template)
    }

    /// Environment variable mapping of the protocol.
    pub fn env_mapping(&self) -> &'static [(&'static str, ProfileField)] {
        self.descriptor().env
    }

    fn descriptor(&self) -> &'static ClientDescriptor {
        ClientDescriptor::for_protocol(self.protocol)
    }

    /// Builds argv and environment for the connection, applying side effects
    /// such as updating `.pgpass`.
    ///
    /// # Errors
    /// Returns `TemplateRender` for a bad template, and propagates password
    /// loader and `.pgpass` I/O errors
    pub fn synthesize(&self) -> Result<ResolvedCommand> {
        let mut passwords = PasswordMemoizer::new(self.connection_name, self.profile, self.loader);

        let password: Option<Password> = if self.profile.requires_password() {
            passwords.get()?.cloned()
        } else {
            None
        };

        let fields: Vec<(&str, Option<String>)> = ProfileField::SUBSTITUTABLE
            .iter()
            .map(|field| (field.name(), self.profile.field(*field)))
            .collect();
        let mut values: Vec<(&str, Option<&str>)> = fields
            .iter()
            .map(|(name, value)| (*name, value.as_deref()))
            .collect();
        values.push((
            ProfileField::Password.name(),
            password.as_ref().map(Password::expose),
        ));

        let argv = crate::template::render_argv(self.template(), &values)?;
        let env = build_env(self.env_mapping(), self.profile, &mut passwords)?;

        let command = ResolvedCommand::new(argv, env).with_secret(password);
        let command = self.side_effects(command, &mut passwords)?;

        debug!(
            "Resolved {} connection {}: {:?}",
            self.protocol, self.connection_name, command
        );
        Ok(command)
    }

    /// Applies protocol-specific side effects. Running them twice leaves the
    /// same command and the same `.pgpass` contents as running them once.
    ///
    /// # Errors
    /// Propagates password loader and `.pgpass` I/O errors
    pub fn side_effects(
        &self,
        command: ResolvedCommand,
        passwords: &mut PasswordMemoizer<'_>,
    ) -> Result<ResolvedCommand> {
        match self.protocol {
            Protocol::PostgreSql => self.postgres_side_effects(command, passwords),
            // MySQL takes the password on the command line; SQLite has none
            Protocol::MySql | Protocol::Sqlite => Ok(command),
        }
    }

    fn postgres_side_effects(
        &self,
        mut command: ResolvedCommand,
        passwords: &mut PasswordMemoizer<'_>,
    ) -> Result<ResolvedCommand> {
        if !self.profile.requires_password() {
            return Ok(command);
        }

        if self.config.pgpass.enable {
            let mut pgpass = PgPass::from_config(self.config)?;

            pgpass.evict_matching(&PgPassEntry::for_profile(self.profile));
            pgpass
                .get_entry(self.connection_name, self.config)?
                .load_password(passwords)?;
            pgpass.write()?;

            // psql reads the password from .pgpass
            command.env.remove(PGPASSWORD);
        } else {
            info!("pgpass is disabled; using PGPASSWORD environment variable");
            if let Some(password) = passwords.get()? {
                command
                    .env
                    .insert(PGPASSWORD.to_string(), password.expose().to_string());
            }
        }

        Ok(command)
    }
}

/// Builds extra environment variables from a descriptor mapping.
///
/// The `password` field is only resolved when the profile requires one.
/// Empty and absent values are left out.
///
/// # Errors
/// Propagates password loader errors
pub fn build_env(
    mapping: &[(&str, ProfileField)],
    profile: &ConnectionProfile,
    passwords: &mut PasswordMemoizer<'_>,
) -> Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();

    for (key, field) in mapping {
        let value = match field {
            ProfileField::Password if profile.requires_password() => {
                passwords.get()?.map(|p| p.expose().to_string())
            }
            field => profile.field(*field),
        };

        if let Some(value) = value.filter(|v| !v.is_empty()) {
            env.insert((*key).to_string(), value);
        }
    }

    Ok(env)
}
