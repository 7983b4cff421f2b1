mod config;

pub mod builder;
pub mod cta;
pub mod manual;
pub mod quality;
pub mod traversal;

use log::{debug, info};

use std::collections::HashMap;

pub use crate::config::*;

/// The number of marker characters written per level of the tree.
pub const DEPTH_STEP: usize = 3;

/// Index of a node in the tree arena.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct NodeId(usize);

/// How many CTA results a node gave under each activation scope.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct ResponseCounts {
    pub any: u32,
    pub active: u32,
    pub current: u32,
}

impl ResponseCounts {
    pub fn get(&self, scope: ActivationScope) -> u32 {
        match scope {
            ActivationScope::Any => self.any,
            ActivationScope::Active => self.active,
            ActivationScope::Current => self.current,
        }
    }

    fn bump(&mut self, scope: ActivationScope) {
        match scope {
            ActivationScope::Any => self.any += 1,
            ActivationScope::Active => self.active += 1,
            ActivationScope::Current => self.current += 1,
        }
    }
}

// Children of an organizer, in the order they were attached.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct OrganizerLinks {
    contacts: Vec<NodeId>,
    organizers: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub contact: Contact,
    parent: Option<NodeId>,
    // Only organizers carry links.
    links: Option<OrganizerLinks>,
    responses: ResponseCounts,
}

impl Node {
    pub fn is_organizer(&self) -> bool {
        self.links.is_some()
    }

    pub fn responses(&self) -> ResponseCounts {
        self.responses
    }

    pub fn is_activated(&self, scope: ActivationScope) -> bool {
        self.responses.get(scope) > 0
    }
}

/// The organizer hierarchy.
///
/// Nodes live in an arena and refer to each other by `NodeId`. All the
/// counts are computed from the live links, so they stay consistent after
/// every call to `add_contact` or `add_organizer`.
#[derive(Debug, Clone, Default)]
pub struct OrganizerTree {
    nodes: Vec<Node>,
    by_eid: HashMap<String, NodeId>,
}

impl OrganizerTree {
    pub fn new() -> OrganizerTree {
        OrganizerTree::default()
    }

    /// Adds an unlinked node. Profiles with a role other than `Contact`
    /// become organizers.
    pub fn insert(&mut self, contact: Contact) -> Result<NodeId, TreeErrors> {
        if self.by_eid.contains_key(&contact.eid) {
            return Err(TreeErrors::DuplicateNode(contact.eid));
        }
        let id = NodeId(self.nodes.len());
        let links = if contact.role.is_organizer() {
            Some(OrganizerLinks::default())
        } else {
            None
        };
        self.by_eid.insert(contact.eid.clone(), id);
        self.nodes.push(Node {
            contact,
            parent: None,
            links,
            responses: ResponseCounts::default(),
        });
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn find(&self, eid: &str) -> Option<NodeId> {
        self.by_eid.get(eid.trim()).cloned()
    }

    /// All the nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(idx, n)| (NodeId(idx), n))
    }

    pub fn organizers(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes()
            .filter(|(_, n)| n.is_organizer())
            .map(|(id, _)| id)
    }

    /// Attaches a plain contact to an organizer.
    pub fn add_contact(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeErrors> {
        if self.get(child).is_organizer() {
            return Err(TreeErrors::NotAContact(self.eid(child)));
        }
        self.link(parent, child)
    }

    /// Attaches an organizer below another organizer.
    pub fn add_organizer(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeErrors> {
        if !self.get(child).is_organizer() {
            return Err(TreeErrors::NotAnOrganizer(self.eid(child)));
        }
        if child == parent || self.ancestors(parent).contains(&child) {
            return Err(TreeErrors::Cycle {
                parent: self.eid(parent),
                child: self.eid(child),
            });
        }
        self.link(parent, child)
    }

    fn link(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeErrors> {
        if !self.get(parent).is_organizer() {
            return Err(TreeErrors::NotAnOrganizer(self.eid(parent)));
        }
        if let Some(previous) = self.nodes[child.0].parent {
            debug!(
                "link: moving {} from {} to {}",
                self.eid(child),
                self.eid(previous),
                self.eid(parent)
            );
            if let Some(links) = self.nodes[previous.0].links.as_mut() {
                links.contacts.retain(|c| *c != child);
                links.organizers.retain(|c| *c != child);
            }
        }
        let child_is_organizer = self.get(child).is_organizer();
        if let Some(links) = self.nodes[parent.0].links.as_mut() {
            if child_is_organizer {
                links.organizers.push(child);
            } else {
                links.contacts.push(child);
            }
        }
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    fn eid(&self, id: NodeId) -> String {
        self.get(id).contact.eid.clone()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    /// A root is a node whose parent did not resolve to an organizer.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.get(id).parent.is_none()
    }

    /// The organizers without a parent, in insertion order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.organizers().filter(|id| self.is_root(*id)).collect()
    }

    /// The chain of organizers above a node, closest first.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut res: Vec<NodeId> = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            res.push(p);
            cur = self.parent(p);
        }
        res
    }

    pub fn direct_contacts(&self, id: NodeId) -> &[NodeId] {
        match &self.get(id).links {
            Some(links) => links.contacts.as_slice(),
            None => &[],
        }
    }

    pub fn sub_organizers(&self, id: NodeId) -> &[NodeId] {
        match &self.get(id).links {
            Some(links) => links.organizers.as_slice(),
            None => &[],
        }
    }

    pub fn direct_contact_count(&self, id: NodeId) -> usize {
        self.direct_contacts(id).len()
    }

    /// The direct contacts of this organizer and of every organizer below it.
    pub fn contact_count(&self, id: NodeId) -> usize {
        let below: usize = self
            .sub_organizers(id)
            .iter()
            .map(|o| self.contact_count(*o))
            .sum();
        self.direct_contact_count(id) + below
    }

    /// The number of organizers below this one, not counting itself.
    pub fn organizer_count(&self, id: NodeId) -> usize {
        let subs = self.sub_organizers(id);
        let below: usize = subs.iter().map(|o| self.organizer_count(*o)).sum();
        subs.len() + below
    }

    /// The identifier shown next to a name in the reports.
    ///
    /// Organizer EIDs carry a prefix: the last segment is kept for EIDs made
    /// of two or three dash-separated segments. Any other shape is shown
    /// as is.
    pub fn contact_id(&self, id: NodeId) -> &str {
        let node = self.get(id);
        let eid = node.contact.eid.as_str();
        if !node.is_organizer() {
            return eid;
        }
        let parts: Vec<&str> = eid.split('-').collect();
        match parts.as_slice() {
            [_, _, third] => third,
            [_, second] => second,
            _ => eid,
        }
    }

    /// `First Last (id)`
    pub fn display_name(&self, id: NodeId) -> String {
        let c = &self.get(id).contact;
        format!("{} {} ({})", c.first_name, c.last_name, self.contact_id(id))
    }

    /// Annotates every node with its response counts.
    ///
    /// Replaces any previous annotation. Results for profiles missing from
    /// the tree are ignored.
    pub fn record_responses(&mut self, results: &[CtaResult], scopes: &ActivationScopes) {
        for node in self.nodes.iter_mut() {
            node.responses = ResponseCounts::default();
        }
        let mut num_unknown: usize = 0;
        for r in results.iter() {
            let id = match self.by_eid.get(r.profile_eid.trim()) {
                Some(id) => *id,
                None => {
                    num_unknown += 1;
                    continue;
                }
            };
            let node = &mut self.nodes[id.0];
            for scope in ActivationScope::ALL {
                if scopes.counts_for(scope, r.cta_id, &node.contact) {
                    node.responses.bump(scope);
                }
            }
        }
        if num_unknown > 0 {
            debug!(
                "record_responses: {} results do not match any profile",
                num_unknown
            );
        }
        info!(
            "record_responses: {} results recorded over {} profiles",
            results.len() - num_unknown,
            self.nodes.len()
        );
    }

    /// Activated direct contacts. This count is not cumulative.
    pub fn activated_contact_count(&self, id: NodeId, scope: ActivationScope) -> usize {
        self.direct_contacts(id)
            .iter()
            .filter(|c| self.get(**c).is_activated(scope))
            .count()
    }

    /// The activation rate as a whole percentage, truncated.
    /// Zero when there are no direct contacts.
    pub fn activation_percent(&self, id: NodeId, scope: ActivationScope) -> u32 {
        let direct = self.direct_contact_count(id);
        if direct == 0 {
            return 0;
        }
        (self.activated_contact_count(id, scope) * 100 / direct) as u32
    }

    /// `activated / direct`, truncated to two decimals.
    pub fn activation_rate(&self, id: NodeId, scope: ActivationScope) -> f64 {
        self.activation_percent(id, scope) as f64 / 100.0
    }

    /// `activated/direct` for the active calls to action.
    pub fn activation_string(&self, id: NodeId) -> String {
        format!(
            "{}/{}",
            self.activated_contact_count(id, ActivationScope::Active),
            self.direct_contact_count(id)
        )
    }

    /// Fills the empty region names, first from the region table, then from
    /// the closest organizer above that has a name.
    pub fn assign_region_names(&mut self, regions: &[Region]) {
        let names: HashMap<i64, &str> = regions.iter().map(|r| (r.id, r.name.as_str())).collect();
        for node in self.nodes.iter_mut() {
            if node.contact.region_name.is_empty() {
                if let Some(name) = names.get(&node.contact.region_id) {
                    node.contact.region_name = name.to_string();
                }
            }
        }
        let inherited: Vec<Option<String>> = (0..self.nodes.len())
            .map(|idx| {
                if !self.nodes[idx].contact.region_name.is_empty() {
                    return None;
                }
                self.ancestors(NodeId(idx))
                    .iter()
                    .map(|a| &self.get(*a).contact.region_name)
                    .find(|name| !name.is_empty())
                    .cloned()
            })
            .collect();
        for (node, name) in self.nodes.iter_mut().zip(inherited) {
            if let Some(name) = name {
                node.contact.region_name = name;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn organizer(eid: &str) -> Contact {
        let mut c = Contact::new(eid, Role::Organizer);
        c.first_name = "Org".to_string();
        c.last_name = eid.to_string();
        c
    }

    fn voter(eid: &str) -> Contact {
        let mut c = Contact::new(eid, Role::Contact);
        c.first_name = "Voter".to_string();
        c.last_name = eid.to_string();
        c
    }

    fn result(eid: &str, cta_id: i64) -> CtaResult {
        CtaResult {
            profile_eid: eid.to_string(),
            cta_id,
            contacted_mts: None,
            answers: HashMap::new(),
            notes: String::new(),
        }
    }

    // root -> (a -> (a1), b), with voters spread over the three levels.
    fn three_levels() -> (OrganizerTree, [NodeId; 4]) {
        let mut t = OrganizerTree::new();
        let root = t.insert(organizer("root")).unwrap();
        let a = t.insert(organizer("a")).unwrap();
        let b = t.insert(organizer("b")).unwrap();
        let a1 = t.insert(organizer("a1")).unwrap();
        t.add_organizer(root, a).unwrap();
        t.add_organizer(root, b).unwrap();
        t.add_organizer(a, a1).unwrap();
        let placements = [(root, 2), (a, 3), (b, 1), (a1, 4)];
        for (org, n) in placements {
            for i in 0..n {
                let eid = format!("{}-v{}", t.eid(org), i);
                let v = t.insert(voter(&eid)).unwrap();
                t.add_contact(org, v).unwrap();
            }
        }
        (t, [root, a, b, a1])
    }

    #[test]
    fn contact_count_is_recursive_sum() {
        let (t, [root, a, b, a1]) = three_levels();
        assert_eq!(t.contact_count(a1), 4);
        assert_eq!(t.contact_count(b), 1);
        assert_eq!(t.contact_count(a), 3 + 4);
        assert_eq!(t.contact_count(root), 2 + 3 + 4 + 1);
        let direct_sum: usize = t.organizers().map(|o| t.direct_contact_count(o)).sum();
        assert_eq!(t.contact_count(root), direct_sum);
    }

    #[test]
    fn organizer_count_excludes_self() {
        let (t, [root, a, b, a1]) = three_levels();
        assert_eq!(t.organizer_count(a1), 0);
        assert_eq!(t.organizer_count(b), 0);
        assert_eq!(t.organizer_count(a), 1);
        assert_eq!(t.organizer_count(root), 3);
    }

    #[test]
    fn counts_follow_mutations() {
        let (mut t, [root, _, b, _]) = three_levels();
        let c = t.insert(organizer("c")).unwrap();
        let v = t.insert(voter("late")).unwrap();
        t.add_contact(c, v).unwrap();
        assert_eq!(t.contact_count(root), 10);
        t.add_organizer(b, c).unwrap();
        assert_eq!(t.contact_count(root), 11);
        assert_eq!(t.organizer_count(root), 4);
        assert_eq!(t.contact_count(b), 2);
    }

    #[test]
    fn relinking_moves_the_child() {
        let (mut t, [root, a, b, a1]) = three_levels();
        t.add_organizer(b, a1).unwrap();
        assert!(t.sub_organizers(a).is_empty());
        assert_eq!(t.contact_count(b), 5);
        assert_eq!(t.contact_count(root), 10);
        assert_eq!(t.parent(a1), Some(b));
    }

    #[test]
    fn linking_rejects_cycles_and_wrong_kinds() {
        let (mut t, [root, a, _, a1]) = three_levels();
        assert!(matches!(
            t.add_organizer(a1, root),
            Err(TreeErrors::Cycle { .. })
        ));
        assert!(matches!(t.add_organizer(a, a), Err(TreeErrors::Cycle { .. })));
        let v = t.direct_contacts(a)[0];
        assert!(matches!(
            t.add_organizer(root, v),
            Err(TreeErrors::NotAnOrganizer(_))
        ));
        assert!(matches!(t.add_contact(root, a1), Err(TreeErrors::NotAContact(_))));
        let other = t.direct_contacts(root)[0];
        assert!(matches!(
            t.add_contact(v, other),
            Err(TreeErrors::NotAnOrganizer(_))
        ));
        assert!(matches!(
            t.insert(organizer("root")),
            Err(TreeErrors::DuplicateNode(_))
        ));
    }

    #[test]
    fn activation_is_local_and_truncated() {
        let (mut t, [root, a, b, a1]) = three_levels();
        // 2 of the 3 direct contacts of `a` responded, one of them twice.
        let results = vec![
            result("a-v0", 1),
            result("a-v0", 2),
            result("a-v1", 2),
            result("a1-v0", 1),
            result("nobody", 1),
        ];
        let scopes = ActivationScopes {
            active_cta_ids: Some([2].into_iter().collect()),
            current: CurrentCta::Ids([1].into_iter().collect()),
        };
        t.record_responses(&results, &scopes);

        assert_eq!(t.activated_contact_count(a, ActivationScope::Any), 2);
        assert_eq!(t.activation_rate(a, ActivationScope::Any), 0.66);
        assert_eq!(t.activated_contact_count(a, ActivationScope::Active), 2);
        assert_eq!(t.activated_contact_count(a, ActivationScope::Current), 1);
        assert_eq!(t.activation_rate(a, ActivationScope::Current), 0.33);
        assert_eq!(t.activation_string(a), "2/3");
        // Not cumulative: the responses below `a` do not count for `root`.
        assert_eq!(t.activated_contact_count(root, ActivationScope::Any), 0);
        assert_eq!(t.activation_rate(a1, ActivationScope::Any), 0.25);
        assert_eq!(t.activation_rate(b, ActivationScope::Any), 0.0);
        let v = t.find("a-v0").unwrap();
        assert_eq!(
            t.get(v).responses(),
            ResponseCounts {
                any: 2,
                active: 1,
                current: 1
            }
        );
    }

    #[test]
    fn activation_rate_without_contacts_is_zero() {
        let mut t = OrganizerTree::new();
        let lonely = t.insert(organizer("lonely")).unwrap();
        t.record_responses(&[result("lonely", 1)], &ActivationScopes::default());
        for scope in ActivationScope::ALL {
            assert_eq!(t.activation_rate(lonely, scope), 0.0);
        }
    }

    #[test]
    fn activation_rate_stays_in_unit_range() {
        let (mut t, orgs) = three_levels();
        let results: Vec<CtaResult> = t
            .nodes()
            .map(|(_, n)| result(&n.contact.eid, 7))
            .collect();
        t.record_responses(&results, &ActivationScopes::default());
        for org in orgs {
            let rate = t.activation_rate(org, ActivationScope::Any);
            assert_eq!(rate, 1.0);
            assert!((0.0..=1.0).contains(&rate));
        }
    }

    #[test]
    fn per_contact_current_cta() {
        let mut t = OrganizerTree::new();
        let org = t.insert(organizer("o")).unwrap();
        let mut c = voter("v");
        c.current_cta_id = 5;
        let v = t.insert(c).unwrap();
        t.add_contact(org, v).unwrap();
        t.record_responses(
            &[result("v", 4), result("v", 5)],
            &ActivationScopes::default(),
        );
        assert_eq!(t.get(v).responses().current, 1);
        assert_eq!(t.get(v).responses().active, 2);
    }

    #[test]
    fn contact_id_lookup_table() {
        let mut t = OrganizerTree::new();
        let three = t.insert(organizer("org-7-123")).unwrap();
        let two = t.insert(organizer("org-456")).unwrap();
        let four = t.insert(organizer("a-b-c-d")).unwrap();
        let plain = t.insert(organizer("plain")).unwrap();
        let v = t.insert(voter("v-1-2")).unwrap();
        assert_eq!(t.contact_id(three), "123");
        assert_eq!(t.contact_id(two), "456");
        assert_eq!(t.contact_id(four), "a-b-c-d");
        assert_eq!(t.contact_id(plain), "plain");
        assert_eq!(t.contact_id(v), "v-1-2");
        assert_eq!(t.display_name(two), "Org org-456 (456)");
    }

    #[test]
    fn region_names_are_late_bound() {
        let (mut t, [root, a, _, a1]) = three_levels();
        t.nodes[root.0].contact.region_id = 3;
        t.nodes[a.0].contact.region_name = "South".to_string();
        let regions = vec![Region {
            id: 3,
            name: "North".to_string(),
            invite_code: String::new(),
            cta_id: Some(9),
            organization_id: 1,
            description: String::new(),
        }];
        t.assign_region_names(&regions);
        assert_eq!(t.get(root).contact.region_name, "North");
        assert_eq!(t.get(a).contact.region_name, "South");
        assert_eq!(t.get(a1).contact.region_name, "South");
        let v = t.direct_contacts(root)[0];
        assert_eq!(t.get(v).contact.region_name, "North");
    }

    #[test]
    fn roots_are_parentless_organizers() {
        let (mut t, [root, ..]) = three_levels();
        let other = t.insert(organizer("other")).unwrap();
        t.insert(voter("orphan")).unwrap();
        assert_eq!(t.roots(), vec![root, other]);
    }
}
