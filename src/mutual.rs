//! The mutual-guild computation: which members share more than one guild
//! with the account owner.

use crate::roster::MemberTag;
use std::collections::{BTreeMap, BTreeSet};

/// Guild name to member tags, bots and the owner already excluded.
pub type GuildMembership = BTreeMap<String, BTreeSet<MemberTag>>;

/// Member tag to the guilds shared with the owner.  Every value set has at
/// least two entries; members seen in only one guild are not mutual.
pub type MutualGuildMap = BTreeMap<MemberTag, BTreeSet<String>>;

/// For each member seen anywhere, scan which guilds they appear in and keep
/// those appearing in more than one.  O(members x guilds), which is fine at
/// the scale of a personal account's guild list.  An empty membership map
/// (every guild failed to resolve) yields an empty result.
pub fn compute(membership: &GuildMembership) -> MutualGuildMap {
    let mut everyone: BTreeSet<&MemberTag> = BTreeSet::new();
    for members in membership.values() {
        everyone.extend(members.iter());
    }

    let mut mutual = MutualGuildMap::new();
    for member in everyone {
        let guilds: BTreeSet<String> = membership
            .iter()
            .filter(|(_, members)| members.contains(member))
            .map(|(guild, _)| guild.clone())
            .collect();
        if guilds.len() > 1 {
            mutual.insert(member.clone(), guilds);
        }
    }

    mutual
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tag(s: &str) -> MemberTag {
        let (name, disc) = s.split_once('#').unwrap();
        MemberTag::new(name, disc.parse().ok())
    }

    fn membership(guilds: &[(&str, &[&str])]) -> GuildMembership {
        guilds
            .iter()
            .map(|(name, members)| {
                (
                    name.to_string(),
                    members.iter().map(|m| tag(m)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn worked_example() {
        // A={alice,bob}, B={alice,carol}, C={carol,dave}
        let membership = membership(&[
            ("A", &["alice#0001", "bob#0002"]),
            ("B", &["alice#0001", "carol#0003"]),
            ("C", &["carol#0003", "dave#0004"]),
        ]);

        let mutual = compute(&membership);

        let expected: MutualGuildMap = [
            (
                tag("alice#0001"),
                BTreeSet::from(["A".to_string(), "B".to_string()]),
            ),
            (
                tag("carol#0003"),
                BTreeSet::from(["B".to_string(), "C".to_string()]),
            ),
        ]
        .into();
        assert_eq!(mutual, expected);
    }

    #[test]
    fn single_guild_members_are_absent() {
        let membership = membership(&[
            ("A", &["alice#0001", "bob#0002"]),
            ("B", &["alice#0001"]),
        ]);

        let mutual = compute(&membership);

        assert!(mutual.contains_key(&tag("alice#0001")));
        assert!(!mutual.contains_key(&tag("bob#0002")));
    }

    #[test]
    fn every_value_set_has_at_least_two_guilds() {
        let membership = membership(&[
            ("A", &["alice#0001", "bob#0002", "carol#0003"]),
            ("B", &["alice#0001", "carol#0003"]),
            ("C", &["alice#0001"]),
            ("D", &["dave#0004"]),
        ]);

        for guilds in compute(&membership).values() {
            assert!(guilds.len() >= 2);
        }
    }

    #[test]
    fn empty_membership_yields_empty_map() {
        assert_eq!(compute(&GuildMembership::new()), MutualGuildMap::new());
    }

    #[test]
    fn unresolved_guild_contributes_nothing() {
        // Guild C failed to resolve, so it never entered the membership map.
        // alice co-occurs with the owner in A and (unresolvable) C, which
        // counts as one guild only.
        let membership = membership(&[
            ("A", &["alice#0001", "bob#0002"]),
            ("B", &["bob#0002"]),
        ]);

        let mutual = compute(&membership);

        assert!(!mutual.contains_key(&tag("alice#0001")));
        assert!(mutual.contains_key(&tag("bob#0002")));
    }
}
