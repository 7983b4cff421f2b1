//! Data-quality classification of contact records.

use crate::config::{Contact, QualityRules};

/// The single data-quality bucket of a contact.
///
/// The checks run in the order of the variants and the first one that
/// applies wins.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum DataQuality {
    VanMatched,
    MissingPhone,
    BadFirstName,
    BadLastName,
    NonAsciiFirstName,
    NonAsciiLastName,
    Clean,
}

/// The coarse partition used by the unmatched-contacts report.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Standing {
    Matched,
    BadData,
    /// Clean data, but no VAN match.
    Unmatched,
}

impl DataQuality {
    pub fn standing(self) -> Standing {
        match self {
            DataQuality::VanMatched => Standing::Matched,
            DataQuality::Clean => Standing::Unmatched,
            _ => Standing::BadData,
        }
    }
}

pub fn classify(contact: &Contact, rules: &QualityRules) -> DataQuality {
    if contact.has_van_match() {
        DataQuality::VanMatched
    } else if contact.phone.trim().is_empty() {
        DataQuality::MissingPhone
    } else if is_bad_first_name(&contact.first_name, rules) {
        DataQuality::BadFirstName
    } else if is_bad_last_name(&contact.last_name, rules) {
        DataQuality::BadLastName
    } else if has_non_ascii(&contact.first_name) {
        DataQuality::NonAsciiFirstName
    } else if has_non_ascii(&contact.last_name) {
        DataQuality::NonAsciiLastName
    } else {
        DataQuality::Clean
    }
}

fn is_bad_first_name(name: &str, rules: &QualityRules) -> bool {
    let name = name.trim();
    name.is_empty()
        || in_stoplist(name, &rules.bad_first_names)
        || has_bad_chars(name, &rules.bad_first_name_chars)
        || has_repeated_run(name, rules.repeated_char_limit)
}

fn is_bad_last_name(name: &str, rules: &QualityRules) -> bool {
    let name = name.trim();
    name.chars().count() < rules.min_last_name_len
        || in_stoplist(name, &rules.bad_last_names)
        || has_bad_chars(name, &rules.bad_last_name_chars)
        || has_repeated_run(name, rules.repeated_char_limit)
}

fn in_stoplist(name: &str, stoplist: &[String]) -> bool {
    let matches = |s: &str| stoplist.iter().any(|bad| bad.eq_ignore_ascii_case(s));
    matches(name) || name.split_whitespace().any(matches)
}

fn has_bad_chars(name: &str, bad: &[char]) -> bool {
    name.chars().any(|c| c.is_ascii_digit() || bad.contains(&c))
}

// Case-insensitive: "Aaab" has a run of three.
fn has_repeated_run(name: &str, limit: usize) -> bool {
    if limit == 0 {
        return false;
    }
    let mut prev: Option<char> = None;
    let mut run: usize = 0;
    for c in name.chars().flat_map(|c| c.to_lowercase()) {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run >= limit {
            return true;
        }
    }
    false
}

// Anything left once the printable ASCII range is removed.
fn has_non_ascii(name: &str) -> bool {
    name.chars().any(|c| !(' '..='~').contains(&c))
}

/// Counters over a collection of contacts, one per bucket.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct QualityTally {
    pub matched: usize,
    pub missing_phone: usize,
    pub bad_first_name: usize,
    pub bad_last_name: usize,
    pub non_ascii_first_name: usize,
    pub non_ascii_last_name: usize,
    pub clean: usize,
}

impl QualityTally {
    pub fn from_contacts<'a>(
        contacts: impl IntoIterator<Item = &'a Contact>,
        rules: &QualityRules,
    ) -> QualityTally {
        let mut tally = QualityTally::default();
        for c in contacts {
            tally.add(classify(c, rules));
        }
        tally
    }

    pub fn add(&mut self, q: DataQuality) {
        match q {
            DataQuality::VanMatched => self.matched += 1,
            DataQuality::MissingPhone => self.missing_phone += 1,
            DataQuality::BadFirstName => self.bad_first_name += 1,
            DataQuality::BadLastName => self.bad_last_name += 1,
            DataQuality::NonAsciiFirstName => self.non_ascii_first_name += 1,
            DataQuality::NonAsciiLastName => self.non_ascii_last_name += 1,
            DataQuality::Clean => self.clean += 1,
        }
    }

    pub fn bad_data(&self) -> usize {
        self.missing_phone
            + self.bad_first_name
            + self.bad_last_name
            + self.non_ascii_first_name
            + self.non_ascii_last_name
    }

    /// Clean contacts are the unmatched ones.
    pub fn unmatched(&self) -> usize {
        self.clean
    }

    pub fn total(&self) -> usize {
        self.matched + self.bad_data() + self.clean
    }
}
