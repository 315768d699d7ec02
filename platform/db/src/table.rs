use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Tables the HR application reads and writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Employees,
    Leaves,
    Excuses,
    Overtime,
    Penalties,
    SalaryDetails,
    Payroll,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Users,
        Table::Employees,
        Table::Leaves,
        Table::Excuses,
        Table::Overtime,
        Table::Penalties,
        Table::SalaryDetails,
        Table::Payroll,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Employees => "employees",
            Table::Leaves => "leaves",
            Table::Excuses => "excuses",
            Table::Overtime => "overtime",
            Table::Penalties => "penalties",
            Table::SalaryDetails => "salary_details",
            Table::Payroll => "payroll",
        }
    }

    /// Tables whose rows go through an approval workflow and carry a
    /// `status` column.
    pub fn has_status(self) -> bool {
        matches!(self, Table::Leaves | Table::Excuses | Table::Overtime)
    }
}

impl AsRef<str> for Table {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown table {0:?}")]
pub struct ParseTableError(String);

impl FromStr for Table {
    type Err = ParseTableError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Table::ALL
            .into_iter()
            .find(|table| table.as_str() == normalized)
            .ok_or_else(|| ParseTableError(value.to_string()))
    }
}
