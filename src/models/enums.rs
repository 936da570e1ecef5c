//! Enums shared by the import, export and conversion layers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PostgreSQL column types produced by the relational compilers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SqlType {
    // Numeric types
    SmallInt,
    Integer,
    BigInt,
    Decimal,
    Numeric,
    Real,
    DoublePrecision,
    Serial,
    BigSerial,

    // Character types
    Varchar,
    Char,
    Text,

    // Date/Time types
    Timestamp,
    TimestampTz,
    Date,
    Time,
    TimeTz,
    Interval,

    // Boolean type
    Boolean,

    // JSON types
    Json,
    Jsonb,
}

impl SqlType {
    /// The SQL spelling of this type
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Decimal => "DECIMAL",
            SqlType::Numeric => "NUMERIC",
            SqlType::Real => "REAL",
            SqlType::DoublePrecision => "DOUBLE PRECISION",
            SqlType::Serial => "SERIAL",
            SqlType::BigSerial => "BIGSERIAL",
            SqlType::Varchar => "VARCHAR",
            SqlType::Char => "CHAR",
            SqlType::Text => "TEXT",
            SqlType::Timestamp => "TIMESTAMP WITH TIME ZONE",
            SqlType::TimestampTz => "TIMESTAMPTZ",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::TimeTz => "TIMETZ",
            SqlType::Interval => "INTERVAL",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Json => "JSON",
            SqlType::Jsonb => "JSONB",
        }
    }

    /// Type a foreign key column must use to reference a key of this type.
    ///
    /// Auto-increment keys are referenced through their underlying integer type.
    pub fn reference_type(&self) -> SqlType {
        match self {
            SqlType::Serial => SqlType::Integer,
            SqlType::BigSerial => SqlType::BigInt,
            other => *other,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// The closed set of representations the dispatcher converts between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataFormat {
    /// TypeScript type definitions
    #[serde(rename = "ts")]
    TypeScript,
    /// Zod validation schema notation
    #[serde(rename = "zod")]
    Zod,
    /// JSON values
    #[serde(rename = "json")]
    Json,
    /// PostgreSQL DDL and DML
    #[serde(rename = "pg")]
    Postgres,
    /// Go struct declarations
    #[serde(rename = "go")]
    Go,
}

impl DataFormat {
    pub const ALL: [DataFormat; 5] = [
        DataFormat::TypeScript,
        DataFormat::Zod,
        DataFormat::Json,
        DataFormat::Postgres,
        DataFormat::Go,
    ];

    /// Short name used by callers ("ts", "zod", "json", "pg", "go")
    pub fn short_name(&self) -> &'static str {
        match self {
            DataFormat::TypeScript => "ts",
            DataFormat::Zod => "zod",
            DataFormat::Json => "json",
            DataFormat::Postgres => "pg",
            DataFormat::Go => "go",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Error returned when a format name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown data format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for DataFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ts" | "typescript" => Ok(DataFormat::TypeScript),
            "zod" => Ok(DataFormat::Zod),
            "json" => Ok(DataFormat::Json),
            "pg" | "postgres" | "postgresql" | "sql" => Ok(DataFormat::Postgres),
            "go" | "golang" => Ok(DataFormat::Go),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}
