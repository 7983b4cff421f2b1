/*!

This is the long-form manual for `organizer_tree` and `empowertree`.

## Input formats

The following formats are supported by `empowertree`:
* `csv` the roster export of the CRM, with its verbose column headers
* `xlsx` the same roster, saved as an Excel workbook (first worksheet)
* `json` the full export: profiles, calls to action, CTA results and regions

Only the `json` format carries calls to action and their results. When the
roster comes as `csv` or `xlsx`, pass the JSON export with `--cta-data` to
get activation numbers.

Missing values are never an error. Names default to `NoFirstName` and
`NoLastName`, the city to `NoCity`, the state to `WI` and the region to 0.
Phone numbers are normalized to the US national format. A number that
cannot be read is replaced by a message that tells the reader to check it.

## The tree

Every profile becomes a node. Profiles with the role `contact` (or no role
at all) are plain contacts, all the other roles are organizers. Each node
is then attached to the organizer named by its parent EID. A node whose
parent is missing, unknown, itself, or a plain contact is a root.

Two numbers are cumulative:
* the contact count of an organizer is its own direct contacts plus the
  contact count of each of its sub-organizers
* the organizer count is the number of organizers below it, itself excluded

## Activation

A contact is activated under a scope when at least one CTA result of that
contact falls in the scope:
* `any`: any call to action
* `active`: the calls to action listed in `activeCtaIds` (all of them when
  the list is not given)
* `current`: the calls to action listed in `currentCtaIds`, or attached to
  a region, or else the current call to action recorded on the contact

The activation rate of an organizer only looks at its direct contacts. It
is truncated to two decimals, so 2 activated contacts out of 3 give `0.66`.
An organizer without direct contacts has a rate of `0.00`.

## Reports

* `tree` the default text report. Sub-organizers are listed by decreasing
  activation rate for the active calls to action. Organizers without direct
  contacts come last. With `--verbose`, each organizer line also shows the
  chain of organizers above it. With `--verbose`, or when the report starts
  at the organizers picked by `--name` or `--id`, the contacts of each
  organizer are listed after its sub-organizers.
* `--ctaoutfile` writes the calls to action with, for each question, the
  number of results per answer option.
* `tree-csv`, `unactivated`, `unmatched`, `activation`, `interest` CSV
  exports. The first cell of each row is indented with `-` for organizers
  and `*` for contacts, three per level. Deleted organizers have no row in
  the CSV exports, but the organizers and contacts below them keep theirs.
  Deleted organizers still appear in the `tree` report.
* `quality` the data-quality summary.

## Data quality

Each contact falls in exactly one bucket. The checks run in order and the
first one that applies wins:

1. matched: the contact has a VAN id
2. missing phone
3. bad first name: blank, in the stoplist, with digits or forbidden
   characters, or with a run of three identical characters
4. bad last name: the same checks, plus anything shorter than three
   characters
5. non-ASCII first name
6. non-ASCII last name
7. clean

Clean contacts without a VAN match are the ones worth matching by hand: the
`unmatched` report lists them under their organizer. The stoplists can be
replaced in the configuration file.

## Using the library

```
use organizer_tree::builder::Builder;
use organizer_tree::quality::{classify, DataQuality};
use organizer_tree::traversal::{keep_all, walk, ChildOrder, TreeRow};
use organizer_tree::*;
use std::collections::HashMap;

let mut builder = Builder::new();
let mut lead = Contact::new("org-1-10", Role::Organizer);
lead.first_name = "Rosa".to_string();
lead.last_name = "Diaz".to_string();
builder.add_profile(lead);
for (eid, phone) in [("v1", "(608) 555-0100"), ("v2", "")] {
    let mut c = Contact::new(eid, Role::Contact);
    c.parent_eid = Some("org-1-10".to_string());
    c.first_name = "Ana".to_string();
    c.last_name = "Lopez".to_string();
    c.phone = phone.to_string();
    builder.add_profile(c);
}
let mut tree = builder.build();

let response = CtaResult {
    profile_eid: "v1".to_string(),
    cta_id: 3,
    contacted_mts: None,
    answers: HashMap::new(),
    notes: String::new(),
};
tree.record_responses(&[response], &ActivationScopes::default());

let lead = tree.find("org-1-10").unwrap();
assert_eq!(tree.display_name(lead), "Rosa Diaz (10)");
assert_eq!(tree.contact_count(lead), 2);
assert_eq!(tree.activation_rate(lead, ActivationScope::Any), 0.5);

let rules = QualityRules::default();
let buckets: Vec<DataQuality> = tree
    .direct_contacts(lead)
    .iter()
    .map(|c| classify(&tree.get(*c).contact, &rules))
    .collect();
assert_eq!(buckets, vec![DataQuality::Clean, DataQuality::MissingPhone]);

let rows = walk(&tree, lead, ChildOrder::Declared, true, &keep_all);
assert_eq!(rows.len(), 2);
assert!(matches!(rows[1], TreeRow::Voters { level: 1, .. }));
```
*/
