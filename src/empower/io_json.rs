// Reading the JSON export: profiles, calls to action, their results and the regions.

use crate::empower::io_common::{normalize_phone, title_case};
use crate::empower::*;

use organizer_tree::cta::{CallToAction, Question};
use serde::{Deserialize, Serialize};
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use std::collections::BTreeMap;
use std::fs;

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonExport {
    pub profiles: Vec<JsonProfile>,
    pub ctas: Vec<JsonCta>,
    #[serde(rename = "ctaResults")]
    pub cta_results: Vec<JsonCtaResult>,
    pub regions: Vec<JsonRegion>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonProfile {
    pub eid: String,
    #[serde(rename = "parentEid")]
    pub parent_eid: Option<String>,
    pub role: Option<String>,
    #[serde(rename = "regionId")]
    pub region_id: Option<i64>,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub address: Option<String>,
    pub address2: Option<String>,
    #[serde(rename = "vanId")]
    pub van_id: Option<JSValue>,
    #[serde(rename = "myCampaignVanId")]
    pub my_campaign_van_id: Option<JSValue>,
    #[serde(rename = "createdMts")]
    pub created_mts: Option<JSValue>,
    #[serde(rename = "currentCtaId")]
    pub current_cta_id: Option<i64>,
    #[serde(rename = "lastUsedEmpowerMts")]
    pub last_used_empower_mts: Option<JSValue>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonQuestion {
    pub key: JSValue,
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<String>,
    pub options: Vec<Option<String>>,
    #[serde(rename = "surveyQuestionVanId")]
    pub survey_question_van_id: Option<i64>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonCta {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "instructionsHtml")]
    pub instructions_html: Option<String>,
    #[serde(rename = "createdMts")]
    pub created_mts: Option<JSValue>,
    #[serde(rename = "organizationId")]
    pub organization_id: Option<i64>,
    #[serde(rename = "regionIds")]
    pub region_ids: Option<Vec<i64>>,
    #[serde(rename = "isIntroCta")]
    pub is_intro_cta: Option<bool>,
    pub questions: Vec<JsonQuestion>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonCtaResult {
    #[serde(rename = "profileEid")]
    pub profile_eid: String,
    #[serde(rename = "ctaId")]
    pub cta_id: i64,
    #[serde(rename = "contactedMts")]
    pub contacted_mts: Option<JSValue>,
    pub answers: Option<JSMap<String, JSValue>>,
    pub notes: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonRegion {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "inviteCode")]
    pub invite_code: Option<String>,
    #[serde(rename = "ctaId")]
    pub cta_id: Option<i64>,
    #[serde(rename = "organizationId")]
    pub organization_id: Option<i64>,
    pub description: Option<String>,
}

pub fn read_json_export(path: &str) -> BEmpowerResult<Export> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JsonExport =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!(
        "read_json_export: {}: {} profiles, {} ctas, {} cta results, {} regions",
        path,
        js.profiles.len(),
        js.ctas.len(),
        js.cta_results.len(),
        js.regions.len()
    );
    Ok(convert_export(js))
}

pub fn convert_export(js: JsonExport) -> Export {
    let mut ctas: BTreeMap<i64, CallToAction> = BTreeMap::new();
    for c in js.ctas {
        let cta = convert_cta(c);
        if ctas.contains_key(&cta.id) {
            warn!("convert_export: duplicate CTA {}, keeping the last one", cta.id);
        }
        ctas.insert(cta.id, cta);
    }
    Export {
        contacts: js.profiles.into_iter().map(convert_profile).collect(),
        ctas,
        results: js.cta_results.into_iter().map(convert_result).collect(),
        regions: js.regions.into_iter().map(convert_region).collect(),
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|x| x.trim().to_string()).filter(|x| !x.is_empty())
}

// Ids and timestamps come as numbers or as strings depending on the export.
fn js_to_string(v: &Option<JSValue>) -> Option<String> {
    match v {
        Some(JSValue::String(s)) => non_empty(Some(s.clone())),
        Some(JSValue::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn js_to_i64(v: &Option<JSValue>) -> Option<i64> {
    match v {
        Some(JSValue::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(JSValue::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn convert_profile(p: JsonProfile) -> Contact {
    let mut c = Contact::new(&p.eid, Role::parse(p.role.as_deref().unwrap_or("")));
    c.parent_eid = non_empty(p.parent_eid);
    c.region_id = p.region_id.unwrap_or(0);
    c.first_name = match non_empty(p.first_name) {
        Some(n) => title_case(&n),
        None => "NoFirstName".to_string(),
    };
    c.last_name = match non_empty(p.last_name) {
        Some(n) if n.contains("DELETED") => n,
        Some(n) => title_case(&n),
        None => "NoLastName".to_string(),
    };
    c.email = p.email.unwrap_or_default();
    c.phone = normalize_phone(p.phone.as_deref().unwrap_or(""));
    if c.phone.starts_with(|ch: char| ch.is_alphabetic()) {
        debug!("convert_profile: {}: {}", c.eid, c.phone);
    }
    c.address = Address {
        street: p.address.unwrap_or_default(),
        street2: p.address2.unwrap_or_default(),
        city: non_empty(p.city).unwrap_or_else(|| "NoCity".to_string()),
        state: non_empty(p.state).unwrap_or_else(|| "WI".to_string()),
        zip: p.zip.unwrap_or_default(),
    };
    c.van_id = js_to_string(&p.van_id);
    c.campaign_van_id = js_to_string(&p.my_campaign_van_id);
    c.created_mts = js_to_i64(&p.created_mts);
    c.current_cta_id = p.current_cta_id.unwrap_or(0);
    // A zero timestamp means the organizer never logged in.
    c.last_used_mts = js_to_i64(&p.last_used_empower_mts).filter(|x| *x != 0);
    c
}

fn question_key(key: &JSValue) -> String {
    match key {
        JSValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn convert_cta(c: JsonCta) -> CallToAction {
    let mut cta = CallToAction::new(c.id, c.name.as_deref().unwrap_or(""));
    cta.instructions_html = c.instructions_html.unwrap_or_default();
    cta.created_mts = js_to_i64(&c.created_mts);
    cta.organization_id = c.organization_id.unwrap_or(0);
    cta.region_ids = c.region_ids.unwrap_or_default().into_iter().collect();
    cta.is_intro_cta = c.is_intro_cta.unwrap_or(false);
    for q in c.questions {
        let labels: Vec<String> = q.options.into_iter().flatten().collect();
        let mut question = Question::new(
            &question_key(&q.key),
            q.text.as_deref().unwrap_or(""),
            q.question_type.as_deref().unwrap_or(""),
            &labels,
        );
        question.survey_question_van_id = q.survey_question_van_id;
        cta.add_question(question);
    }
    cta
}

fn convert_result(r: JsonCtaResult) -> CtaResult {
    let answers = r
        .answers
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let answer = match v {
                JSValue::Null => None,
                JSValue::String(s) => Some(s),
                other => Some(other.to_string()),
            };
            (k, answer)
        })
        .collect();
    CtaResult {
        profile_eid: r.profile_eid.trim().to_string(),
        cta_id: r.cta_id,
        contacted_mts: js_to_i64(&r.contacted_mts),
        answers,
        notes: r.notes.unwrap_or_default(),
    }
}

fn convert_region(r: JsonRegion) -> Region {
    Region {
        id: r.id,
        name: r.name.unwrap_or_default(),
        invite_code: r.invite_code.unwrap_or_default(),
        cta_id: r.cta_id,
        organization_id: r.organization_id.unwrap_or(0),
        description: r.description.unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "profiles": [
            {"eid": " org-1-10 ", "parentEid": null, "role": "organizer", "regionId": 3,
             "firstName": "rosa", "lastName": "DIAZ", "phone": "608 555 0100",
             "vanId": 1234, "createdMts": 1614816000000, "lastUsedEmpowerMts": 0},
            {"eid": "v1", "parentEid": "org-1-10", "role": "contact",
             "firstName": null, "lastName": "DELETED user", "phone": "",
             "vanId": "", "city": "", "currentCtaId": 4}
        ],
        "ctas": [
            {"id": 4, "name": "Pledge", "isIntroCta": false, "regionIds": [3],
             "questions": [{"key": 1, "text": "Will you vote?", "type": "select",
                            "options": ["Yes", "", null, "No"]}]}
        ],
        "ctaResults": [
            {"profileEid": "v1 ", "ctaId": 4, "contactedMts": 1614816000000,
             "answers": {"1": "Yes/Si", "2": null}, "notes": null}
        ],
        "regions": [
            {"id": 3, "name": "North", "inviteCode": "N", "ctaId": 4, "organizationId": 1}
        ]
    }"#;

    fn export() -> Export {
        convert_export(serde_json::from_str(EXPORT).unwrap())
    }

    #[test]
    fn profiles_get_defaults() {
        let e = export();
        let org = &e.contacts[0];
        assert_eq!(org.eid, "org-1-10");
        assert_eq!(org.parent_eid, None);
        assert_eq!(org.role, Role::Organizer);
        assert_eq!(org.first_name, "Rosa");
        assert_eq!(org.last_name, "Diaz");
        assert_eq!(org.phone, "(608) 555-0100");
        assert_eq!(org.van_id.as_deref(), Some("1234"));
        assert_eq!(org.address.city, "NoCity");
        assert_eq!(org.address.state, "WI");
        assert_eq!(org.created_mts, Some(1_614_816_000_000));
        assert_eq!(org.last_used_mts, None);

        let v = &e.contacts[1];
        assert_eq!(v.first_name, "NoFirstName");
        assert_eq!(v.last_name, "DELETED user");
        assert_eq!(v.phone, "");
        assert_eq!(v.van_id, None);
        assert_eq!(v.parent_eid.as_deref(), Some("org-1-10"));
        assert_eq!(v.current_cta_id, 4);
        assert_eq!(v.region_id, 0);
    }

    #[test]
    fn ctas_and_results() {
        let e = export();
        let cta = &e.ctas[&4];
        assert_eq!(cta.name, "Pledge");
        assert_eq!(cta.region_ids.iter().cloned().collect::<Vec<_>>(), vec![3]);
        let q = cta.question("1").unwrap();
        let labels: Vec<&str> = q.options().iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["Yes", "No"]);

        let r = &e.results[0];
        assert_eq!(r.profile_eid, "v1");
        assert_eq!(r.answers["1"].as_deref(), Some("Yes/Si"));
        assert_eq!(r.answers["2"], None);
        assert_eq!(r.notes, "");
        assert_eq!(e.regions[0].cta_id, Some(4));
    }

    #[test]
    fn missing_sections_are_empty() {
        let js: JsonExport = serde_json::from_str(r#"{"profiles": []}"#).unwrap();
        let e = convert_export(js);
        assert!(e.contacts.is_empty() && e.ctas.is_empty() && e.results.is_empty());
    }
}
