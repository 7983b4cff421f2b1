// Reading the roster export in CSV form.

use std::io;

use serde::{Deserialize, Serialize};

use crate::empower::io_common::{iso_date_to_mts, normalize_phone, title_case};
use crate::empower::*;

/// One row of the roster export. The Excel export has the same columns.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvProfile {
    #[serde(rename = "EID")]
    pub eid: String,
    #[serde(rename = "Parent EID")]
    pub parent_eid: String,
    #[serde(rename = "Role")]
    pub role: String,
    #[serde(rename = "Region Name")]
    pub region_name: String,
    #[serde(rename = "First Name")]
    pub first_name: String,
    #[serde(rename = "Last Name")]
    pub last_name: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Zip Code")]
    pub zip: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Address Line 2")]
    pub address2: String,
    #[serde(rename = "vanId")]
    pub van_id: String,
    #[serde(rename = "myCampaignVanId")]
    pub my_campaign_van_id: String,
    #[serde(rename = "Created At")]
    pub created_at: String,
    #[serde(rename = "Last Used Empower")]
    pub last_used_empower: String,
}

fn non_empty(s: &str) -> Option<String> {
    Some(s.trim().to_string()).filter(|x| !x.is_empty())
}

impl CsvProfile {
    pub fn into_contact(self) -> Contact {
        let mut c = Contact::new(&self.eid, Role::parse(&self.role));
        c.parent_eid = non_empty(&self.parent_eid);
        c.region_name = self.region_name.trim().to_string();
        c.first_name = title_case(self.first_name.trim());
        c.last_name = if self.last_name.contains("DELETED") {
            self.last_name.trim().to_string()
        } else {
            title_case(self.last_name.trim())
        };
        c.email = self.email;
        c.phone = normalize_phone(&self.phone);
        c.address = Address {
            street: self.address,
            street2: self.address2,
            city: self.city,
            state: non_empty(&self.state).unwrap_or_else(|| "WI".to_string()),
            zip: self.zip,
        };
        c.van_id = non_empty(&self.van_id);
        c.campaign_van_id = non_empty(&self.my_campaign_van_id);
        c.created_mts = iso_date_to_mts(&self.created_at);
        c.last_used_mts = iso_date_to_mts(&self.last_used_empower);
        c
    }
}

pub fn read_csv_profiles(path: &str) -> BEmpowerResult<Vec<Contact>> {
    let rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let contacts = parse_profiles(rdr, path)?;
    info!("read_csv_profiles: {}: {} profiles", path, contacts.len());
    Ok(contacts)
}

pub fn parse_profiles<R: io::Read>(
    mut rdr: csv::Reader<R>,
    path: &str,
) -> BEmpowerResult<Vec<Contact>> {
    let mut res: Vec<Contact> = Vec::new();
    for (idx, line_r) in rdr.deserialize::<CsvProfile>().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("parse_profiles: lineno: {:?} row: {:?}", lineno, line);
        res.push(line.into_contact());
    }
    Ok(res)
}
