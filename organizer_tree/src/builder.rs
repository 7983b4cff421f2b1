pub use crate::config::*;

use crate::{NodeId, OrganizerTree};
use log::{debug, info, warn};
use std::collections::HashMap;

/// A builder for the organizer tree.
///
/// Profiles can be added in any order: the links are only resolved in
/// `build`, once every profile is known.
///
/// ```
/// use organizer_tree::builder::Builder;
/// use organizer_tree::{Contact, Role};
///
/// let mut builder = Builder::new();
/// let mut voter = Contact::new("v1", Role::Contact);
/// voter.parent_eid = Some("o1".to_string());
/// builder.add_profile(voter);
/// builder.add_profile(Contact::new("o1", Role::Organizer));
///
/// let tree = builder.build();
/// let o1 = tree.find("o1").unwrap();
/// assert_eq!(tree.contact_count(o1), 1);
/// ```
#[derive(Debug, Default)]
pub struct Builder {
    profiles: Vec<Contact>,
    positions: HashMap<String, usize>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Adds one profile.
    ///
    /// A profile naming itself as parent is kept as a root. When two
    /// profiles share an EID, the last one wins.
    pub fn add_profile(&mut self, mut contact: Contact) {
        if contact.parent_eid() == Some(contact.eid.as_str()) {
            warn!(
                "add_profile: {} {} ({}) is its own parent, treating it as a root",
                contact.first_name, contact.last_name, contact.eid
            );
            contact.parent_eid = None;
        }
        if let Some(pos) = self.positions.get(&contact.eid) {
            warn!(
                "add_profile: duplicate EID {}, keeping the last record",
                contact.eid
            );
            self.profiles[*pos] = contact;
        } else {
            self.positions
                .insert(contact.eid.clone(), self.profiles.len());
            self.profiles.push(contact);
        }
    }

    pub fn add_profiles(&mut self, contacts: impl IntoIterator<Item = Contact>) {
        for c in contacts {
            self.add_profile(c);
        }
    }

    /// Creates every node, then links each node to its parent organizer.
    ///
    /// Nodes whose parent is absent, unknown or not an organizer become
    /// roots.
    pub fn build(self) -> OrganizerTree {
        let mut tree = OrganizerTree::new();
        let mut ids: Vec<NodeId> = Vec::with_capacity(self.profiles.len());
        for p in self.profiles {
            match tree.insert(p) {
                Ok(id) => ids.push(id),
                Err(e) => warn!("build: skipping profile: {}", e),
            }
        }

        let mut num_unresolved: usize = 0;
        for id in ids.iter() {
            let parent_eid = match tree.get(*id).contact.parent_eid() {
                Some(p) => p.to_string(),
                None => continue,
            };
            let parent = match tree.find(&parent_eid) {
                Some(p) => p,
                None => {
                    debug!(
                        "build: parent {} of {} is not in the export",
                        parent_eid,
                        tree.get(*id).contact.eid
                    );
                    num_unresolved += 1;
                    continue;
                }
            };
            let res = if tree.get(*id).is_organizer() {
                tree.add_organizer(parent, *id)
            } else {
                tree.add_contact(parent, *id)
            };
            if let Err(e) = res {
                warn!(
                    "build: {} stays a root: {}",
                    tree.get(*id).contact.eid,
                    e
                );
            }
        }

        info!(
            "build: {} profiles, {} organizers, {} roots, {} unresolved parents",
            tree.len(),
            tree.organizers().count(),
            tree.roots().len(),
            num_unresolved
        );
        tree
    }
}
