//! Type-safe configuration types for the installer
//!
//! Database selection is an enum rather than a string so unknown values are
//! rejected while resolving configuration, not halfway through the install.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Database driver used by the Moodle install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// MySQL via the mysqli driver
    Mysqli,
    Mariadb,
    /// PostgreSQL
    Pgsql,
    /// Microsoft SQL Server
    Sqlsrv,
}

impl DbType {
    /// Superuser account the CI images ship with
    pub fn default_user(&self) -> &'static str {
        match self {
            Self::Mysqli | Self::Mariadb => "root",
            Self::Pgsql => "postgres",
            Self::Sqlsrv => "sa",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_db_type_parses_lowercase_names() {
        assert_eq!("mysqli".parse::<DbType>().unwrap(), DbType::Mysqli);
        assert_eq!("pgsql".parse::<DbType>().unwrap(), DbType::Pgsql);
        assert!("oracle".parse::<DbType>().is_err());
    }

    #[test]
    fn test_db_type_display_roundtrip() {
        for db in DbType::iter() {
            assert_eq!(db.to_string().parse::<DbType>().unwrap(), db);
        }
    }

    #[test]
    fn test_default_users() {
        assert_eq!(DbType::Mariadb.default_user(), "root");
        assert_eq!(DbType::Pgsql.default_user(), "postgres");
    }
}
