//! Backend collections and how their endpoints are shaped.

use std::fmt;

/// How a collection expects create/update bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyEncoding {
    Multipart,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Moulds,
    Changeovers,
    Calendar,
    Tpm,
    Book,
    CurrentSv,
    Operations,
    Tasks,
    Orders,
    OrderTypes,
    Workstations,
    MachineStatuses,
    MachineGroups,
    ProductionLogs,
}

impl Resource {
    pub const ALL: [Resource; 14] = [
        Resource::Moulds,
        Resource::Changeovers,
        Resource::Calendar,
        Resource::Tpm,
        Resource::Book,
        Resource::CurrentSv,
        Resource::Operations,
        Resource::Tasks,
        Resource::Orders,
        Resource::OrderTypes,
        Resource::Workstations,
        Resource::MachineStatuses,
        Resource::MachineGroups,
        Resource::ProductionLogs,
    ];

    /// Short name used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Moulds => "moulds",
            Self::Changeovers => "changeovers",
            Self::Calendar => "calendar",
            Self::Tpm => "tpm",
            Self::Book => "book",
            Self::CurrentSv => "current-sv",
            Self::Operations => "operations",
            Self::Tasks => "tasks",
            Self::Orders => "orders",
            Self::OrderTypes => "order-types",
            Self::Workstations => "workstations",
            Self::MachineStatuses => "machine-statuses",
            Self::MachineGroups => "machine-groups",
            Self::ProductionLogs => "logs",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|resource| resource.name() == name)
    }

    /// Collection path relative to the API base.
    pub fn collection_path(self) -> &'static str {
        match self {
            Self::Moulds => "moulds",
            Self::Changeovers => "changeovers/",
            Self::Calendar => "calendar/",
            Self::Tpm => "tpm/",
            Self::Book => "book/",
            Self::CurrentSv => "current_sv/",
            Self::Operations => "production/operations",
            Self::Tasks => "production/tasks",
            Self::Orders => "production/orders",
            Self::OrderTypes => "production/order-types",
            Self::Workstations => "production/workstations",
            Self::MachineStatuses => "production/machine-statuses",
            Self::MachineGroups => "production/machine-groups",
            Self::ProductionLogs => "production/logs",
        }
    }

    /// Path of one record. Moulds are addressed by number, the rest by id.
    pub fn item_path(self, id: &str) -> String {
        let id = encode_segment(id);
        match self {
            Self::Changeovers => format!("changeovers/{id}/"),
            _ => format!("{}/{id}", self.collection_path().trim_end_matches('/')),
        }
    }

    /// Create target; moulds take a trailing slash on POST.
    pub fn create_path(self) -> &'static str {
        match self {
            Self::Moulds => "moulds/",
            _ => self.collection_path(),
        }
    }

    /// Audit log of one record, for collections that keep one.
    pub fn history_path(self, id: &str) -> Option<String> {
        let id = encode_segment(id);
        match self {
            Self::Changeovers => Some(format!("changeovers/{id}/log/")),
            Self::Calendar => Some(format!("calendar/{id}/log/")),
            _ => None,
        }
    }

    /// `limit` sent with list requests by default.
    pub fn default_limit(self) -> Option<u32> {
        match self {
            Self::Moulds => Some(20_000),
            Self::Changeovers | Self::Calendar | Self::Tpm | Self::CurrentSv => Some(5_000),
            _ => None,
        }
    }

    pub fn body_encoding(self) -> BodyEncoding {
        match self {
            Self::Moulds
            | Self::Changeovers
            | Self::Calendar
            | Self::Tpm
            | Self::Book
            | Self::CurrentSv => BodyEncoding::Multipart,
            _ => BodyEncoding::Json,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Percent-encode one path segment.
fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.trim().as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Limit for history requests.
pub const HISTORY_LIMIT: u32 = 200;
