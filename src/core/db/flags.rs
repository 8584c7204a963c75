/// Error Classification Module
///
/// Maps backend failures onto the small set of error classes a caller may
/// declare harmless for one call, and models the per-call flag set.

use crate::core::{DbError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::ffi;
use serde::Serialize;
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

/// A class of SQL error that can be suppressed by a matching flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClass {
    MissingTable,
    TableExists,
    DuplicateFieldName,
    DuplicateKeyName,
    DuplicateKeyValue,
}

impl ErrorClass {
    /// Whether the given flags declare this class harmless.
    ///
    /// "Table exists" and "duplicate key name" are one condition on the
    /// server side (a relation with that name already exists), so either
    /// flag covers both classes.
    pub fn suppressed_by(self, flags: Flags) -> bool {
        match self {
            ErrorClass::MissingTable => flags.contains(Flag::MissingTableOk),
            ErrorClass::TableExists | ErrorClass::DuplicateKeyName => {
                flags.contains(Flag::TableExistsOk) || flags.contains(Flag::DupKeyNameOk)
            }
            ErrorClass::DuplicateFieldName => flags.contains(Flag::DupFieldNameOk),
            ErrorClass::DuplicateKeyValue => flags.contains(Flag::DupKeyOk),
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::MissingTable => "missing table",
            ErrorClass::TableExists => "table already exists",
            ErrorClass::DuplicateFieldName => "duplicate field name",
            ErrorClass::DuplicateKeyName => "duplicate key name",
            ErrorClass::DuplicateKeyValue => "duplicate key value",
        };
        f.write_str(name)
    }
}

/// A per-call modifier of the access layer's behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Flag {
    /// Failure to connect returns no connection instead of an error
    NoConnectOk = 1 << 0,
    MissingTableOk = 1 << 1,
    TableExistsOk = 1 << 2,
    DupFieldNameOk = 1 << 3,
    DupKeyNameOk = 1 << 4,
    DupKeyOk = 1 << 5,
}

impl Flag {
    pub const ALL: [Flag; 6] = [
        Flag::NoConnectOk,
        Flag::MissingTableOk,
        Flag::TableExistsOk,
        Flag::DupFieldNameOk,
        Flag::DupKeyNameOk,
        Flag::DupKeyOk,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Flag::NoConnectOk => "no-connect-ok",
            Flag::MissingTableOk => "missing-table-ok",
            Flag::TableExistsOk => "table-exists-ok",
            Flag::DupFieldNameOk => "dup-field-name-ok",
            Flag::DupKeyNameOk => "dup-key-name-ok",
            Flag::DupKeyOk => "dup-key-ok",
        }
    }
}

impl FromStr for Flag {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        Flag::ALL
            .into_iter()
            .find(|flag| flag.name() == s)
            .ok_or_else(|| DbError::Internal(format!("unknown flag '{}'", s)))
    }
}

/// A set of flags. The empty set makes every error fatal.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    pub const fn empty() -> Self {
        Flags(0)
    }

    pub fn contains(self, flag: Flag) -> bool {
        self.0 & flag as u8 != 0
    }

    pub fn insert(&mut self, flag: Flag) {
        self.0 |= flag as u8;
    }

    pub fn without(self, flag: Flag) -> Self {
        Flags(self.0 & !(flag as u8))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Flag> {
        Flag::ALL.into_iter().filter(move |flag| self.contains(*flag))
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Flag::name)).finish()
    }
}

impl From<Flag> for Flags {
    fn from(flag: Flag) -> Self {
        Flags(flag as u8)
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut flags = Flags::empty();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl BitOr for Flag {
    type Output = Flags;

    fn bitor(self, rhs: Flag) -> Flags {
        Flags(self as u8 | rhs as u8)
    }
}

impl BitOr<Flag> for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flag) -> Flags {
        Flags(self.0 | rhs as u8)
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

/// A failed statement as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlFailure {
    /// Extended SQLite result code
    pub code: i32,
    pub class: Option<ErrorClass>,
    pub message: String,
}

impl SqlFailure {
    pub fn from_rusqlite(err: &rusqlite::Error) -> Self {
        let (code, message) = match err {
            rusqlite::Error::SqliteFailure(e, msg) => (
                e.extended_code,
                msg.clone().unwrap_or_else(|| e.to_string()),
            ),
            other => (ffi::SQLITE_ERROR, other.to_string()),
        };
        SqlFailure {
            code,
            class: classify(code, &message),
            message,
        }
    }

    pub fn into_error(self, statement: &str) -> DbError {
        DbError::Sql {
            code: self.code,
            class: self.class,
            message: self.message,
            statement: statement.to_string(),
        }
    }
}

static MESSAGE_CLASSES: Lazy<Vec<(Regex, ErrorClass)>> = Lazy::new(|| {
    [
        (r"^no such table: \S+", ErrorClass::MissingTable),
        (r"^(table|view) \S+ already exists", ErrorClass::TableExists),
        (r"^index \S+ already exists", ErrorClass::DuplicateKeyName),
        (r"^duplicate column name: \S+", ErrorClass::DuplicateFieldName),
    ]
    .into_iter()
    .map(|(pattern, class)| (Regex::new(pattern).expect("valid classification pattern"), class))
    .collect()
});

/// Map a backend result code and message onto a suppressible class.
///
/// Uniqueness violations carry their own extended codes. Schema errors all
/// share the generic SQLITE_ERROR code and are told apart by message.
pub fn classify(code: i32, message: &str) -> Option<ErrorClass> {
    match code & 0xff {
        ffi::SQLITE_CONSTRAINT => match code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                Some(ErrorClass::DuplicateKeyValue)
            }
            // primary code only, when extended codes are off
            ffi::SQLITE_CONSTRAINT if message.starts_with("UNIQUE constraint failed") => {
                Some(ErrorClass::DuplicateKeyValue)
            }
            _ => None,
        },
        ffi::SQLITE_ERROR => MESSAGE_CLASSES
            .iter()
            .find(|(pattern, _)| pattern.is_match(message))
            .map(|(_, class)| *class),
        _ => None,
    }
}
