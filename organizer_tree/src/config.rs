// ********* Input data structures ***********

use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::Display;

/// The role of a profile, as exported by the CRM.
///
/// Every role except `Contact` makes the profile an organizer node.
/// Deleted organizers keep their place in the tree.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum Role {
    Contact,
    Organizer,
    Admin,
    Deleted,
    Other(String),
}

impl Role {
    /// Case-insensitive parsing. A blank role is a plain contact.
    pub fn parse(s: &str) -> Role {
        match s.trim().to_lowercase().as_str() {
            "" | "contact" => Role::Contact,
            "organizer" => Role::Organizer,
            "admin" => Role::Admin,
            "deleted" => Role::Deleted,
            x => Role::Other(x.to_string()),
        }
    }

    pub fn is_organizer(&self) -> bool {
        !matches!(self, Role::Contact)
    }

    pub fn is_deleted(&self) -> bool {
        *self == Role::Deleted
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Address {
    pub street: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// One constituent, as normalized by the input adapters.
///
/// The phone is already in national format, or holds one of the adapters'
/// sentinel messages. An empty phone means no phone was listed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Contact {
    pub eid: String,
    pub parent_eid: Option<String>,
    pub van_id: Option<String>,
    pub campaign_van_id: Option<String>,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub address: Address,
    /// Epoch milliseconds.
    pub created_mts: Option<i64>,
    /// Epoch milliseconds of the last login. Only meaningful for organizers.
    pub last_used_mts: Option<i64>,
    pub region_id: i64,
    pub region_name: String,
    pub current_cta_id: i64,
}

impl Contact {
    /// A contact with only an identity. The adapters fill in the rest.
    pub fn new(eid: &str, role: Role) -> Contact {
        Contact {
            eid: eid.trim().to_string(),
            parent_eid: None,
            van_id: None,
            campaign_van_id: None,
            role,
            first_name: String::new(),
            last_name: String::new(),
            phone: String::new(),
            email: String::new(),
            address: Address::default(),
            created_mts: None,
            last_used_mts: None,
            region_id: 0,
            region_name: String::new(),
            current_cta_id: 0,
        }
    }

    /// Lower-cased first and last name, concatenated without separator.
    pub fn full_name(&self) -> String {
        format!(
            "{}{}",
            self.first_name.to_lowercase(),
            self.last_name.to_lowercase()
        )
    }

    pub fn has_van_match(&self) -> bool {
        self.van_id.is_some()
    }

    pub fn van_id_or_empty(&self) -> &str {
        self.van_id.as_deref().unwrap_or("")
    }

    pub fn parent_eid(&self) -> Option<&str> {
        self.parent_eid.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub invite_code: String,
    pub cta_id: Option<i64>,
    pub organization_id: i64,
    pub description: String,
}

/// The response of one constituent to one call to action.
///
/// A key present with `None` (or an empty string) is a null answer. A key
/// absent from the map means the question was not asked.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CtaResult {
    pub profile_eid: String,
    pub cta_id: i64,
    /// Epoch milliseconds.
    pub contacted_mts: Option<i64>,
    pub answers: HashMap<String, Option<String>>,
    pub notes: String,
}

// ******** Output data structures *********

/// Errors raised when linking nodes of the tree by hand.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TreeErrors {
    DuplicateNode(String),
    NotAnOrganizer(String),
    NotAContact(String),
    /// The link would make a node its own ancestor.
    Cycle { parent: String, child: String },
}

impl Error for TreeErrors {}

impl Display for TreeErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeErrors::DuplicateNode(eid) => write!(f, "duplicate node {}", eid),
            TreeErrors::NotAnOrganizer(eid) => write!(f, "{} is not an organizer", eid),
            TreeErrors::NotAContact(eid) => write!(f, "{} is not a plain contact", eid),
            TreeErrors::Cycle { parent, child } => {
                write!(f, "linking {} under {} would create a cycle", child, parent)
            }
        }
    }
}

// ********* Configuration **********

/// The three windows under which a contact counts as activated.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ActivationScope {
    /// Any call to action since the beginning of the program.
    Any,
    /// The calls to action currently running.
    Active,
    /// The current call to action of the contact's region.
    Current,
}

impl ActivationScope {
    pub const ALL: [ActivationScope; 3] = [
        ActivationScope::Any,
        ActivationScope::Active,
        ActivationScope::Current,
    ];
}

/// How the "current" call to action is determined.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CurrentCta {
    /// A fixed set of CTA ids, usually the CTAs attached to the regions.
    Ids(HashSet<i64>),
    /// The `current_cta_id` recorded on each contact.
    PerContact,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ActivationScopes {
    /// `None` means that every CTA is active.
    pub active_cta_ids: Option<HashSet<i64>>,
    pub current: CurrentCta,
}

impl ActivationScopes {
    /// Whether a result for `cta_id`, given by `contact`, counts under `scope`.
    pub fn counts_for(&self, scope: ActivationScope, cta_id: i64, contact: &Contact) -> bool {
        match scope {
            ActivationScope::Any => true,
            ActivationScope::Active => match &self.active_cta_ids {
                Some(ids) => ids.contains(&cta_id),
                None => true,
            },
            ActivationScope::Current => match &self.current {
                CurrentCta::Ids(ids) => ids.contains(&cta_id),
                CurrentCta::PerContact => {
                    contact.current_cta_id != 0 && contact.current_cta_id == cta_id
                }
            },
        }
    }
}

impl Default for ActivationScopes {
    fn default() -> Self {
        ActivationScopes {
            active_cta_ids: None,
            current: CurrentCta::PerContact,
        }
    }
}

pub const DEFAULT_BAD_FIRST_NAME_CHARS: [char; 7] = ['.', '?', '(', ')', '<', '!', '`'];
pub const DEFAULT_BAD_LAST_NAME_CHARS: [char; 4] = ['?', '<', '!', '*'];

pub const DEFAULT_BAD_FIRST_NAMES: [&str; 34] = [
    "NoFirstName", "Seiu", "Hna", "Hno", "Br", "Brother", "Sister", "Mn", "Grandpa", "Grandma",
    "Tia", "Tio", "Pastor", "Ald", "Coach", "Mr", "Mrs", "Ms", "Sr", "Jr", "Sra", "Miss",
    "Father", "Com", "Hermano", "Empowered", "Mom", "Dad", "Ma", "Bro", "Mommy", "Uncle", "Aunt",
    "Auntie",
];

pub const DEFAULT_BAD_LAST_NAMES: [&str; 7] =
    ["NoLastName", "Seiu", "Mash", "Daca", "Dad", "Coach", "Matc"];

/// The rules of the contact data-quality filter.
///
/// Stoplist entries are compared case-insensitively against the whole name
/// and against each of its whitespace-separated words.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct QualityRules {
    pub bad_first_name_chars: Vec<char>,
    pub bad_last_name_chars: Vec<char>,
    pub bad_first_names: Vec<String>,
    pub bad_last_names: Vec<String>,
    /// Last names shorter than this are malformed.
    pub min_last_name_len: usize,
    /// A run of this many identical characters makes a name malformed.
    pub repeated_char_limit: usize,
}

impl Default for QualityRules {
    fn default() -> Self {
        QualityRules {
            bad_first_name_chars: DEFAULT_BAD_FIRST_NAME_CHARS.to_vec(),
            bad_last_name_chars: DEFAULT_BAD_LAST_NAME_CHARS.to_vec(),
            bad_first_names: DEFAULT_BAD_FIRST_NAMES.iter().map(|s| s.to_string()).collect(),
            bad_last_names: DEFAULT_BAD_LAST_NAMES.iter().map(|s| s.to_string()).collect(),
            min_last_name_len: 3,
            repeated_char_limit: 3,
        }
    }
}
