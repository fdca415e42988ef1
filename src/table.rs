//! Tabular summary of the mutual-guild map.

use crate::mutual::MutualGuildMap;
use crate::roster::MemberTag;
use std::collections::BTreeSet;

pub struct SummaryTable {
    /// Guilds appearing in at least one member's mutual set.  Guilds nobody
    /// shares are not listed, so there are no all-zero columns.
    pub columns: Vec<String>,
    /// Sorted by `num_mutual_guilds` descending; ties keep map order, which
    /// is alphabetical by member tag.
    pub rows: Vec<SummaryRow>,
}

pub struct SummaryRow {
    pub member: MemberTag,
    /// Membership indicator per column, in `columns` order.
    pub flags: Vec<bool>,
    pub num_mutual_guilds: usize,
}

pub fn format(mutual: &MutualGuildMap) -> SummaryTable {
    let columns: Vec<String> = mutual
        .values()
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect();

    let mut rows: Vec<SummaryRow> = mutual
        .iter()
        .map(|(member, guilds)| SummaryRow {
            member: member.clone(),
            flags: columns.iter().map(|c| guilds.contains(c)).collect(),
            num_mutual_guilds: guilds.len(),
        })
        .collect();
    rows.sort_by(|a, b| b.num_mutual_guilds.cmp(&a.num_mutual_guilds));

    SummaryTable { columns, rows }
}
