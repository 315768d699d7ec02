use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Permission tier of the caller. Only [`Role::LimitedAdmin`] changes what
/// the data layer does: it may not list salary or payroll rows.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    LimitedAdmin,
    Employee,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::LimitedAdmin => "admin_1",
            Role::Employee => "employee",
            Role::Other(value) => value,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            "admin_1" => Role::LimitedAdmin,
            "employee" => Role::Employee,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn can_view_compensation(&self) -> bool {
        !matches!(self, Role::LimitedAdmin)
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Role::parse(value))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
