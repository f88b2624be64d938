//! Database creation step.

use super::{InstallOutput, Installer, StepKind};
use crate::error::Result;
use crate::process::{CommandLine, Execute};
use crate::types::DbType;

/// Connection details needed to create the Moodle database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Database {
    pub db_type: DbType,
    pub user: String,
    pub pass: String,
    pub name: String,
    pub host: String,
    pub port: Option<u16>,
}

impl Database {
    /// Client command that creates the database.
    ///
    /// The password travels in the client's environment variable, never as
    /// an argument.
    pub fn create_command(&self) -> CommandLine {
        let cmd = match self.db_type {
            DbType::Mysqli | DbType::Mariadb => {
                let mut cmd = CommandLine::new("mysql").args(["-u", self.user.as_str(), "-h", self.host.as_str()]);
                if let Some(port) = self.port {
                    cmd = cmd.arg("-P").arg(port.to_string());
                }
                cmd.arg("-e").arg(format!(
                    "CREATE DATABASE IF NOT EXISTS `{}` DEFAULT CHARACTER SET utf8mb4 DEFAULT COLLATE utf8mb4_unicode_ci;",
                    self.name
                ))
            }
            DbType::Pgsql => {
                let mut cmd = CommandLine::new("psql").args(["-U", self.user.as_str(), "-h", self.host.as_str()]);
                if let Some(port) = self.port {
                    cmd = cmd.arg("-p").arg(port.to_string());
                }
                cmd.args(["-d", "postgres", "-c"])
                    .arg(format!("CREATE DATABASE \"{}\";", self.name))
            }
            DbType::Sqlsrv => {
                let server = match self.port {
                    Some(port) => format!("{},{}", self.host, port),
                    None => self.host.clone(),
                };
                CommandLine::new("sqlcmd")
                    .args(["-S", server.as_str(), "-U", self.user.as_str(), "-Q"])
                    .arg(format!(
                        "CREATE DATABASE [{}] COLLATE Latin1_General_CS_AS",
                        self.name
                    ))
            }
        };

        if self.pass.is_empty() {
            return cmd;
        }
        let password_var = match self.db_type {
            DbType::Mysqli | DbType::Mariadb => "MYSQL_PWD",
            DbType::Pgsql => "PGPASSWORD",
            DbType::Sqlsrv => "SQLCMDPASSWORD",
        };
        cmd.env(password_var, &self.pass)
    }
}

/// Creates the Moodle database through the database's CLI client.
#[derive(Debug, Clone)]
pub struct DatabaseInstaller {
    pub database: Database,
}

impl Installer for DatabaseInstaller {
    fn kind(&self) -> StepKind {
        StepKind::DatabaseCreate
    }

    fn install(&self, execute: &dyn Execute, output: &mut InstallOutput) -> Result<()> {
        output.info(&format!(
            "Creating {} database '{}' on {}",
            self.database.db_type, self.database.name, self.database.host
        ));
        execute
            .run(&self.database.create_command())?
            .ensure_success(&self.kind().to_string(), "database create")
    }

    fn describe(&self) -> String {
        format!("Create {} database", self.database.db_type)
    }
}
